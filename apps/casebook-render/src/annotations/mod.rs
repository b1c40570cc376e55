//! Annotation records and the page scan that reads them

mod scan;
mod types;

pub use scan::{scan_page, PageManifest, ScanError};
pub use scan::{
    ATTR_ANNOTATION_ID, ATTR_ANNOTATION_TYPE, ATTR_DATETIME, ATTR_END_OFFSET, ATTR_NODE_ID,
    ATTR_SECTION_TIMESTAMP, ATTR_START_OFFSET, ATTR_STYLESHEET, ATTR_USE_PAGEDJS,
};
pub use types::{
    format_datetime_attr, format_display_date, parse_datetime, sort_document_order, Annotation,
    AnnotationKind, UnknownKind,
};
