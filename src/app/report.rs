use crate::domain::model::{Extraction, ItemListing, JobPosting, JobPostings, RunOutcome, RunResponse};
use std::fmt::Write as _;

/// Console rendering of a run result.
pub trait Render {
    fn render(&self) -> String;
}

fn field(out: &mut String, label: &str, value: &str) {
    let value = if value.trim().is_empty() { "-" } else { value.trim() };
    let _ = writeln!(out, "{:<14}{}", format!("{}:", label), value);
}

impl Render for ItemListing {
    fn render(&self) -> String {
        let mut out = String::new();
        field(&mut out, "Name", &self.name);
        field(&mut out, "Price (CAD)", &self.price);
        field(&mut out, "Brand", &self.brand);
        field(&mut out, "Stock", &self.stock);
        field(&mut out, "Description", &self.description);
        field(&mut out, "URL", &self.url);
        out
    }
}

impl Render for JobPosting {
    fn render(&self) -> String {
        let mut out = String::new();
        field(&mut out, "Title", &self.title);
        field(&mut out, "Company", &self.company);
        field(&mut out, "Location", &self.location);
        field(&mut out, "Level", &self.level);
        field(&mut out, "Work mode", &self.work_mode);
        field(&mut out, "Salary", &self.salary);
        field(&mut out, "Experience", &self.years_of_experience);
        field(&mut out, "Description", &self.description);
        field(&mut out, "URL", &self.url);
        out
    }
}

impl Render for JobPostings {
    fn render(&self) -> String {
        if self.items.is_empty() {
            return "No job postings on this page.\n".to_string();
        }
        self.items
            .iter()
            .enumerate()
            .map(|(i, posting)| format!("#{}\n{}", i + 1, posting.render()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<T: Render> Render for RunResponse<T> {
    fn render(&self) -> String {
        match &self.outcome {
            RunOutcome::NotFound { message } => format!("{}\n", message),
            RunOutcome::Found {
                source_url,
                extraction: Extraction::Record { record },
            } => format!("Source: {}\n\n{}", source_url, record.render()),
            RunOutcome::Found {
                source_url,
                extraction: Extraction::Empty { reason },
            } => format!(
                "Source: {}\n\nNo details could be extracted ({}).\n",
                source_url, reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RunEvent;

    fn response<T>(outcome: RunOutcome<T>) -> RunResponse<T> {
        RunResponse {
            run_id: "run-1".to_string(),
            session_id: None,
            event: RunEvent::WorkflowCompleted,
            attempts: 1,
            created_at: chrono::Utc::now(),
            outcome,
        }
    }

    #[test]
    fn test_render_item_listing() {
        let listing = ItemListing {
            name: "Galaxy S25".to_string(),
            price: "1099.99".to_string(),
            brand: "Samsung".to_string(),
            stock: "".to_string(),
            description: "Phone".to_string(),
            url: "https://a.ca/1".to_string(),
        };
        let text = response(RunOutcome::Found {
            source_url: "https://a.ca/1".to_string(),
            extraction: Extraction::Record { record: listing },
        })
        .render();

        assert!(text.starts_with("Source: https://a.ca/1\n\n"));
        assert!(text.contains("Name:         Galaxy S25\n"));
        assert!(text.contains("Stock:        -\n"));
    }

    #[test]
    fn test_render_not_found() {
        let text = response::<JobPostings>(RunOutcome::NotFound {
            message: "Sorry, could not find relevant job postings".to_string(),
        })
        .render();

        assert_eq!(text, "Sorry, could not find relevant job postings\n");
    }

    #[test]
    fn test_render_empty_extraction() {
        let text = response::<ItemListing>(RunOutcome::Found {
            source_url: "https://a.ca/1".to_string(),
            extraction: Extraction::Empty {
                reason: "page unavailable".to_string(),
            },
        })
        .render();

        assert!(text.contains("No details could be extracted (page unavailable)"));
    }
}
