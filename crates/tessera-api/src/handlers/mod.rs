pub mod extract;
pub mod upload_content;
