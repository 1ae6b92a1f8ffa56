pub mod cascade;
pub mod document;
pub mod fields;
pub mod label;
pub mod live;
pub mod local;

pub use document::PageView;

/// Which field strategies to run: rendered catalog pages carry field
/// classes, saved pages are matched by their printed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Live,
    Saved,
}

/// Markup → course, for either ingestion path.
pub fn extract_course(markup: &str, url: &str, flavor: Flavor) -> crate::record::Course {
    let view = PageView::parse(markup);
    match flavor {
        Flavor::Live => live::extract(&view, url),
        Flavor::Saved => local::extract(&view, url),
    }
}
