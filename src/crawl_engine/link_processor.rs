//! Link processing and frontier admission
//!
//! Discovered links are canonicalized, checked against the seen sketch and
//! the excluded patterns, classified by the filter profile and pushed under
//! the admission policy, up to a per-page cap.

use log::debug;
use std::collections::HashSet;

use super::admission::LinkClass;
use super::metrics::bump;
use super::page_processor::WorkerContext;
use crate::utils::{canonical_url, is_valid_url};

/// What happened to one page's links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkBatchOutcome {
    pub discovered: usize,
    pub enqueued: usize,
    pub dropped_full: usize,
    pub not_admitted: usize,
}

/// Push admissible links found on `source_url` into the frontier
pub fn enqueue_discovered_links(
    ctx: &WorkerContext,
    source_url: &str,
    links: HashSet<String>,
) -> LinkBatchOutcome {
    let max_inserts = ctx.config.max_inserts_per_page();
    let capacity = ctx.frontier.capacity();
    let mut outcome = LinkBatchOutcome {
        discovered: links.len(),
        ..LinkBatchOutcome::default()
    };

    for raw in links {
        if !is_valid_url(&raw) {
            continue;
        }
        let Some(url) = canonical_url(&raw, ctx.config.keep_query()) else {
            continue;
        };
        if ctx.config.is_excluded(&url) {
            bump(&ctx.metrics.excluded);
            continue;
        }
        if ctx.met_urls.contains(&url) {
            continue;
        }

        let class = LinkClass::of(&ctx.profile, &url);
        if !ctx
            .policy
            .admit(class, ctx.frontier.len(), capacity, ctx.sampler.as_ref())
        {
            outcome.not_admitted += 1;
            continue;
        }

        if ctx.frontier.try_push(url) {
            outcome.enqueued += 1;
            bump(&ctx.metrics.enqueued);
        } else {
            outcome.dropped_full += 1;
            bump(&ctx.metrics.dropped_full);
        }

        if outcome.enqueued >= max_inserts {
            break;
        }
    }

    debug!(
        target: "snapcrawl::links",
        "{source_url}: {} links found, {} enqueued, {} not admitted, {} dropped (frontier full)",
        outcome.discovered,
        outcome.enqueued,
        outcome.not_admitted,
        outcome.dropped_full
    );
    outcome
}
