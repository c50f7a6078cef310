// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::types::{BlogRecord, RecordStatus};
use chrono::{TimeZone, Utc};


fn sample_record(id: &str) -> BlogRecord {
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 6, 30, 0).unwrap();
    BlogRecord {
        id: id.to_string(),
        slug: "better-sleep-tonight".into(),
        title: "Better Sleep Tonight".into(),
        body: "## Intro\n\nSleep matters.".into(),
        description: "How to sleep better.".into(),
        keywords: vec!["sleep tips".into(), "bedtime".into()],
        keyword: "sleep tips".into(),
        tags: vec!["health".into(), "sleep".into()],
        image_urls: vec![
            "https://cdn.example.com/images/blogs/r/0.png".into(),
            "https://cdn.example.com/images/blogs/r/1.png".into(),
        ],
        author: "Daisy".into(),
        avatar: "/images/blog-authors/Daisy.webp".into(),
        color: "#A8A0F9".into(),
        org: "https://cdn.example.com/images/blogs/r/0-org.png".into(),
        card: "https://cdn.example.com/images/blogs/r/0-card.png".into(),
        cover: "https://cdn.example.com/images/blogs/r/0-cover.png".into(),
        status: RecordStatus::Complete,
        published: true,
        created_at: at,
        updated_at: at,
    }
}
