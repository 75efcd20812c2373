pub mod interview;
pub mod job_description;
pub mod outreach;
pub mod resume;
