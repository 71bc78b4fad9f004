//! Concurrent admin sessions against one site.

use hf_integration_tests::TestSite;
use hf_site::{GalleryDraft, PromotionDraft, SiteError};

const WRITERS: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_all_listed() {
    let site = TestSite::new();

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let gallery = site.site.dashboard.gallery.clone();
        handles.push(tokio::spawn(async move {
            let draft = GalleryDraft {
                image_url: format!("https://cdn.example/{i}.jpg"),
                title: format!("Job {i}"),
                ..Default::default()
            };
            gallery.create(&draft).await.unwrap()
        }));
    }

    let mut created = Vec::new();
    for handle in handles {
        created.push(handle.await.unwrap().id);
    }

    let listed = site.site.dashboard.gallery.list().await.unwrap();
    assert_eq!(listed.len(), WRITERS);
    for id in created {
        assert!(listed.iter().any(|g| g.id == id));
    }
    assert_eq!(site.site.public.gallery().await.unwrap().len(), WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_last_write_wins() {
    let site = TestSite::new();
    let promotions = site.site.dashboard.promotions.clone();

    let row = promotions
        .create(&PromotionDraft {
            title: "Summer Sale".into(),
            description: "Trucks".into(),
            discount_percentage: "5".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let id = row.id;

    let mut handles = Vec::new();
    for pct in 10..10 + WRITERS {
        let promotions = promotions.clone();
        handles.push(tokio::spawn(async move {
            let draft = PromotionDraft {
                title: "Summer Sale".into(),
                description: "Trucks".into(),
                discount_percentage: pct.to_string(),
                ..Default::default()
            };
            promotions.update(id, &draft).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let listed = promotions.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    let final_pct = listed[0].discount_percentage.unwrap();
    assert!((10.0..(10 + WRITERS) as f64).contains(&final_pct));

    let badge = site.site.public.promotions().await.unwrap()[0].badge.clone();
    assert_eq!(badge, Some(format!("{final_pct}% OFF")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_update_racing_delete_leaves_row_deleted() {
    let site = TestSite::new();
    let gallery = site.site.dashboard.gallery.clone();

    for i in 0..100 {
        let row = gallery
            .create(&GalleryDraft {
                image_url: format!("https://cdn.example/r{i}.jpg"),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = row.id;

        let updater = {
            let gallery = gallery.clone();
            tokio::spawn(async move {
                let draft = GalleryDraft {
                    image_url: format!("https://cdn.example/r{i}-v2.jpg"),
                    title: "Retouched".into(),
                    ..Default::default()
                };
                gallery.update(id, &draft).await
            })
        };
        let deleter = {
            let gallery = gallery.clone();
            tokio::spawn(async move { gallery.delete(id).await })
        };

        match updater.await.unwrap() {
            Ok(_) | Err(SiteError::NotFound { .. }) => {}
            Err(e) => panic!("unexpected update failure: {e}"),
        }
        deleter.await.unwrap().unwrap();

        assert!(gallery.list().await.unwrap().is_empty(), "row {id} came back");
        assert!(matches!(gallery.get(id).await, Err(SiteError::NotFound { .. })));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_during_writes_never_go_stale() {
    let site = TestSite::new();
    let gallery = site.site.dashboard.gallery.clone();
    let public = site.site.public.clone();

    let reader = tokio::spawn(async move {
        let mut last = 0;
        for _ in 0..50 {
            let seen = public.gallery().await.unwrap().len();
            assert!(seen >= last, "listing went backwards: {seen} < {last}");
            last = seen;
            tokio::task::yield_now().await;
        }
    });

    for i in 0..WRITERS {
        gallery
            .create(&GalleryDraft {
                image_url: format!("https://cdn.example/w{i}.jpg"),
                ..Default::default()
            })
            .await
            .unwrap();
        // Each write is visible to the next read.
        assert_eq!(site.site.public.gallery().await.unwrap().len(), i + 1);
    }

    reader.await.unwrap();
}
