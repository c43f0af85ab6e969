use somba_forum::catalog::{AgentQueue, AnalyticsSource, FaqCatalog, QuestionCatalog, StaticCatalog};
use somba_forum::models::{AnalyticsRange, Category, QuestionStatus, Trend};

#[tokio::test]
async fn listing_filters_by_exact_category() {
    let c = StaticCatalog::new();

    let all = c.list_questions(None).await.unwrap();
    assert_eq!(all.len(), 6);
    let ids: Vec<&str> = all.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5", "6"]);

    let payments = c.list_questions(Some(Category::Payments)).await.unwrap();
    assert_eq!(payments.len(), 2);
    assert!(payments.iter().all(|q| q.category == Category::Payments));

    assert!(c.list_questions(Some(Category::Account)).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_uses_faq_and_forum_statuses() {
    let all = StaticCatalog::new().list_questions(None).await.unwrap();
    let faqs = all.iter().filter(|q| q.status == QuestionStatus::Faq).count();
    let posts = all.iter().filter(|q| q.status == QuestionStatus::ForumPost).count();
    assert_eq!((faqs, posts), (3, 3));
}

#[tokio::test]
async fn detail_lookups_return_the_fixed_record() {
    let c = StaticCatalog::new();
    let a = c.get_thread("1").await.unwrap();
    let b = c.get_thread("does-not-matter").await.unwrap();
    assert_eq!(a.title, b.title);
    assert_eq!(b.id, "does-not-matter");
    assert_eq!(a.related.len(), 3);
    assert!(a.related.iter().all(|r| r.href.starts_with("/thread/")));

    let faq = c.get_faq("7").await.unwrap();
    assert_eq!(faq.id, "7");
    assert_eq!(faq.helpful_count, 42);
    assert_eq!(faq.troubleshooting.len(), 4);
    assert!(faq.related.iter().all(|r| r.href.starts_with("/faq/")));
}

#[tokio::test]
async fn agent_queue_and_stats() {
    let c = StaticCatalog::new();
    let queue = c.unanswered().await.unwrap();
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.iter().filter(|e| e.urgent).count(), 2);

    let stats = c.dashboard_stats().await.unwrap();
    assert_eq!(stats.open_threads, 12);
    assert_eq!(stats.avg_response_time, "4.2 hours");
    assert_eq!(stats.answered_today, 8);
    assert_eq!(stats.pending_faqs, 3);
}

#[tokio::test]
async fn analytics_report_is_static_for_every_range() {
    let c = StaticCatalog::new();
    let week = c.report(AnalyticsRange::Last7Days).await.unwrap();
    let quarter = c.report(AnalyticsRange::Last90Days).await.unwrap();
    assert_eq!(week.kpis.len(), 4);
    assert_eq!(week.kpis[2].trend, Trend::Down);
    assert_eq!(week.posts_over_time.len(), 5);
    assert_eq!(week.category_distribution.len(), 6);
    assert_eq!(week.top_questions.len(), 5);
    let funnel: Vec<u32> = week.deflection_funnel.iter().map(|s| s.count).collect();
    assert_eq!(funnel, vec![1523, 1102, 421]);
    assert_eq!(quarter.kpis[0].value, week.kpis[0].value);
}
