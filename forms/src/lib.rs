pub mod conv;
pub mod field;
pub mod form;
pub mod media;
pub mod multidict;
pub mod perm;
pub mod templates;
pub mod value;
pub mod widget;

pub use conv::{Conv, Converter, ValidationError};
pub use field::{Field, FieldKind, Item, WidgetRef};
pub use form::{BoundField, Form};
pub use media::{Media, MediaAtom};
pub use multidict::{MultiDict, RawValue};
pub use perm::{FieldPerm, Perms};
pub use value::{UploadedFile, Value};
pub use widget::{FieldBlock, NoFieldWidget, RenderType, Widget, WidgetKind};
