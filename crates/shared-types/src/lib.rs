//! Shared document model for the signing workflow
//!
//! Flow documents, raw `mappingData` entries, actors and the projected field
//! shapes handed to renderers. Everything here is plain data with serde
//! support; the logic lives in `shared-pdf` and `docsign-core`.

pub mod actor;
pub mod field;
pub mod flow;
pub mod lenient;
pub mod mapping;

pub use actor::{looks_like_email, ActorDescriptor, ContactHints, EmailPrecedence, Identity};
pub use field::{
    Attachment, DateComponent, DatePart, FieldDefinition, FieldType, FieldValue, GroupOption,
    PdfRect, PlacedField, Placement, ProjectedField, ScreenPosition,
};
pub use flow::{ContractType, Document, Entity, EntityType, FlowStep, Status, ValidateType};
pub use mapping::{
    CollectionKind, MappingCollections, RawAttachment, RawDateElement, RawDateGroup, RawField,
    RawGeometry, RawOption, RawOptionGroup,
};
