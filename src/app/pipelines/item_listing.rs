use crate::app::services::AgentServices;
use crate::core::agents::{LlmExtractor, LlmSearcher};
use crate::core::workflow::{Workflow, WorkflowSettings};
use crate::domain::model::ItemListing;
use crate::domain::ports::ConfigProvider;

pub const NAME: &str = "find-item-listing";

pub type FindItemListing = Workflow<LlmSearcher, LlmExtractor<ItemListing>>;

pub fn searcher_instructions() -> Vec<String> {
    vec![
        "Given an item name, search the item listing on websites other than Amazon for its purchase and return the top websites where it can be purchased from.".to_string(),
        "Prefer pages that show a single product with its price, over category or search pages.".to_string(),
    ]
}

pub fn extractor_instructions() -> Vec<String> {
    vec![
        "1. Given an item listing website, read the page and find the listing of the given product.".to_string(),
        "2. Report the title of the product, the price in CAD, the brand name, the stock availability and a brief description.".to_string(),
        "3. Check product stock availability.".to_string(),
        "Use the page URL for the url field.".to_string(),
    ]
}

pub fn not_found_message(item: &str) -> String {
    format!("Sorry, could not find listings of {}", item)
}

pub fn build<C: ConfigProvider>(
    services: &AgentServices,
    config: &C,
    session_id: &str,
) -> FindItemListing {
    let searcher = LlmSearcher::new(
        services.model.clone(),
        services.web.clone(),
        searcher_instructions(),
    )
    .with_limits(config.max_hits(), config.max_results());

    let extractor = LlmExtractor::new(
        services.model.clone(),
        services.fetcher.clone(),
        extractor_instructions(),
    );

    let settings = WorkflowSettings::new(NAME)
        .with_max_attempts(config.max_attempts())
        .with_retry_delay(config.retry_delay())
        .with_session_id(session_id);

    Workflow::new(searcher, extractor, settings, not_found_message)
}
