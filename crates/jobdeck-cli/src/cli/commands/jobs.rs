//! Job feed and search command handlers.

use anyhow::Result;
use jobdeck_core::api::types::{JobPosting, JobSearch};
use jobdeck_core::sync::pagination::{PaginatedCollection, ResultPage};

use super::Controller;

pub async fn list(controller: &Controller, page: u32, per_page: u32, all: bool) -> Result<()> {
    let api = controller.api();
    let feed: PaginatedCollection<JobPosting> = PaginatedCollection::new();

    feed.load(|_| async move { api.jobs(page, per_page).await.map(ResultPage::from) })
        .await?;

    if all {
        while !feed.is_last_page_reached() {
            feed.load_more(|next| async move {
                api.jobs(next, per_page).await.map(ResultPage::from)
            })
            .await?;
        }
    }

    print_feed(&feed);
    Ok(())
}

pub async fn search(
    controller: &Controller,
    query: &str,
    location: Option<String>,
    flash: bool,
    per_page: u32,
) -> Result<()> {
    let api = controller.api();
    let search = JobSearch {
        query: Some(query.to_string()),
        location,
        flash_only: flash,
    };
    let results: PaginatedCollection<JobPosting> = PaginatedCollection::new();

    let search_ref = &search;
    results
        .load(|page| async move {
            api.search_jobs(search_ref, page, per_page)
                .await
                .map(ResultPage::from)
        })
        .await?;

    if results.is_empty() {
        println!("No postings matched.");
        return Ok(());
    }
    print_feed(&results);
    Ok(())
}

fn print_feed(feed: &PaginatedCollection<JobPosting>) {
    for job in feed.items() {
        println!("{}", format_job(&job));
    }
    let suffix = if feed.is_last_page_reached() {
        ""
    } else {
        " (more available)"
    };
    println!(
        "— {} postings, page {}{}",
        feed.len(),
        feed.current_page(),
        suffix
    );
}

fn format_job(job: &JobPosting) -> String {
    let mut line = format!("#{:<6} {}", job.id, job.title);
    if let Some(company) = job.company.as_deref() {
        line.push_str(&format!(" @ {company}"));
    }
    if let Some(location) = job.location.as_deref() {
        line.push_str(&format!(" ({location})"));
    }
    if job.is_flash {
        line.push_str(" [flash]");
    }
    if job.is_favorite {
        line.push_str(" ★");
    }
    if let Some(posted) = job.created_at.as_deref() {
        if let Ok(date) = chrono::DateTime::parse_from_rfc3339(posted) {
            line.push_str(&format!("  posted {}", date.format("%Y-%m-%d")));
        }
    }
    line
}
