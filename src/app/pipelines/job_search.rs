use crate::app::services::AgentServices;
use crate::core::agents::{LlmExtractor, LlmSearcher};
use crate::core::workflow::{Workflow, WorkflowSettings};
use crate::domain::model::JobPostings;
use crate::domain::ports::ConfigProvider;

pub const NAME: &str = "find-job-postings";

pub const NOT_FOUND_MESSAGE: &str = "Sorry, could not find relevant job postings";

pub type FindJobPostings = Workflow<LlmSearcher, LlmExtractor<JobPostings>>;

pub fn searcher_instructions() -> Vec<String> {
    vec![
        "Given the information you have from the reference document (a resume), pick the job postings from the web search results that are the most relevant to the experience and skills it mentions.".to_string(),
        "Return the top websites where those job postings can be found.".to_string(),
    ]
}

pub fn extractor_instructions() -> Vec<String> {
    vec![
        "1. Given a job posting website, read the page and find the details of the different job listings available.".to_string(),
        "2. For each listing report the job title, company name, location, level (entry level, intermediate, senior and so on), job description, mode of work (remote, hybrid or in person), salary if mentioned, required years of experience and the URL of the posting.".to_string(),
        "Use an empty string for details the page does not mention.".to_string(),
    ]
}

pub fn build<C: ConfigProvider>(
    services: &AgentServices,
    config: &C,
    session_id: &str,
) -> FindJobPostings {
    let mut searcher = LlmSearcher::new(
        services.model.clone(),
        services.web.clone(),
        searcher_instructions(),
    )
    .with_limits(config.max_hits(), config.max_results());

    match &services.knowledge {
        Some(kb) => {
            searcher = searcher.with_knowledge_base(kb.clone(), config.knowledge_max_chars());
        }
        None => tracing::warn!("⚠️ {}: no knowledge base configured, searching by query only", NAME),
    }

    let extractor = LlmExtractor::new(
        services.model.clone(),
        services.fetcher.clone(),
        extractor_instructions(),
    );

    let settings = WorkflowSettings::new(NAME)
        .with_max_attempts(config.max_attempts())
        .with_retry_delay(config.retry_delay())
        .with_session_id(session_id);

    Workflow::new(searcher, extractor, settings, |_| NOT_FOUND_MESSAGE.to_string())
}
