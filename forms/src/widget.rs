use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{field::Item, media::Media};

/// How a container lays out a widget next to its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderType {
    /// Label in the usual place.
    #[default]
    Default,
    /// Label and widget close to each other.
    Checkbox,
    FullWidth,
    /// No label at all.
    Hidden,
}

type Getter = dyn Fn(&str) -> String + Send + Sync;

#[derive(Clone)]
pub enum WidgetKind {
    TextInput,
    Textarea,
    HiddenInput,
    PasswordInput,
    Select {
        size: Option<u32>,
        null_label: String,
    },
    CheckBoxSelect {
        null_label: String,
    },
    CheckBox,
    CharDisplay {
        escape: bool,
        getter: Option<Arc<Getter>>,
    },
    FileInput,
    FieldSet,
    FieldList,
}

impl WidgetKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TextInput => "TextInput",
            Self::Textarea => "Textarea",
            Self::HiddenInput => "HiddenInput",
            Self::PasswordInput => "PasswordInput",
            Self::Select { .. } => "Select",
            Self::CheckBoxSelect { .. } => "CheckBoxSelect",
            Self::CheckBox => "CheckBox",
            Self::CharDisplay { .. } => "CharDisplay",
            Self::FileInput => "FileInput",
            Self::FieldSet => "FieldSetWidget",
            Self::FieldList => "FieldListWidget",
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::FieldSet | Self::FieldList)
    }
}

impl fmt::Debug for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

const NULL_LABEL: &str = "--------";

/// Presentation of a field: which template renders it and how.
#[derive(Debug, Clone)]
pub struct Widget {
    kind: WidgetKind,
    template: String,
    classname: Option<String>,
    render_type: RenderType,
    media: Media,
}

impl Widget {
    fn with_kind(kind: WidgetKind, template: &str, classname: Option<&str>) -> Self {
        Self {
            kind,
            template: template.to_owned(),
            classname: classname.map(str::to_owned),
            render_type: RenderType::Default,
            media: Media::new(),
        }
    }

    pub fn text_input() -> Self {
        Self::with_kind(WidgetKind::TextInput, "widgets/textinput", Some("textinput"))
    }

    pub fn textarea() -> Self {
        Self::with_kind(WidgetKind::Textarea, "widgets/textarea", None)
    }

    pub fn hidden_input() -> Self {
        Self::with_kind(WidgetKind::HiddenInput, "widgets/hiddeninput", None)
            .with_render_type(RenderType::Hidden)
    }

    pub fn password_input() -> Self {
        Self::with_kind(
            WidgetKind::PasswordInput,
            "widgets/passwordinput",
            Some("textinput"),
        )
    }

    /// Options come from the field's choice converter.
    pub fn select() -> Self {
        Self::with_kind(
            WidgetKind::Select {
                size: None,
                null_label: NULL_LABEL.to_owned(),
            },
            "widgets/select",
            None,
        )
    }

    pub fn checkbox_select() -> Self {
        Self::with_kind(
            WidgetKind::CheckBoxSelect {
                null_label: NULL_LABEL.to_owned(),
            },
            "widgets/select-checkbox",
            Some("select-checkbox"),
        )
    }

    pub fn checkbox() -> Self {
        Self::with_kind(WidgetKind::CheckBox, "widgets/checkbox", None)
            .with_render_type(RenderType::Checkbox)
    }

    /// Read-only text.
    pub fn char_display() -> Self {
        Self::with_kind(
            WidgetKind::CharDisplay {
                escape: true,
                getter: None,
            },
            "widgets/span",
            Some("chardisplay"),
        )
    }

    pub fn file_input() -> Self {
        Self::with_kind(WidgetKind::FileInput, "widgets/file", None)
    }

    pub fn field_set() -> Self {
        Self::with_kind(WidgetKind::FieldSet, "widgets/fieldset", None)
    }

    pub fn field_list() -> Self {
        Self::with_kind(WidgetKind::FieldList, "widgets/fieldlist", None)
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_owned();
        self
    }

    pub fn with_classname(mut self, classname: &str) -> Self {
        self.classname = Some(classname.to_owned());
        self
    }

    pub fn with_render_type(mut self, render_type: RenderType) -> Self {
        self.render_type = render_type;
        self
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    /// Only meaningful for `Select`.
    pub fn with_size(mut self, rows: u32) -> Self {
        if let WidgetKind::Select { size, .. } = &mut self.kind {
            *size = Some(rows);
        }
        self
    }

    pub fn with_null_label(mut self, label: &str) -> Self {
        match &mut self.kind {
            WidgetKind::Select { null_label, .. } | WidgetKind::CheckBoxSelect { null_label } => {
                *null_label = label.to_owned();
            }
            _ => {}
        }
        self
    }

    /// Only meaningful for `CharDisplay`.
    pub fn with_escape(mut self, enabled: bool) -> Self {
        if let WidgetKind::CharDisplay { escape, .. } = &mut self.kind {
            *escape = enabled;
        }
        self
    }

    /// Only meaningful for `CharDisplay`.
    pub fn with_getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        if let WidgetKind::CharDisplay { getter, .. } = &mut self.kind {
            *getter = Some(Arc::new(f));
        }
        self
    }

    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn classname(&self) -> Option<&str> {
        self.classname.as_deref()
    }

    pub fn render_type(&self) -> RenderType {
        self.render_type
    }

    pub fn media(&self) -> &Media {
        &self.media
    }
}

type RenderFn = dyn Fn() -> String + Send + Sync;

/// Widget that is not bound to a field (decorations, help text, buttons).
/// It renders regardless of field permissions.
#[derive(Clone)]
pub struct NoFieldWidget {
    template: String,
    classname: Option<String>,
    media: Media,
    render: Option<Arc<RenderFn>>,
}

impl NoFieldWidget {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_owned(),
            classname: None,
            media: Media::new(),
            render: None,
        }
    }

    /// Renders by calling `f` instead of a template.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            template: String::new(),
            classname: None,
            media: Media::new(),
            render: Some(Arc::new(f)),
        }
    }

    pub fn with_classname(mut self, classname: &str) -> Self {
        self.classname = Some(classname.to_owned());
        self
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn classname(&self) -> Option<&str> {
        self.classname.as_deref()
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    pub(crate) fn render_override(&self) -> Option<String> {
        self.render.as_ref().map(|f| f())
    }
}

impl fmt::Debug for NoFieldWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoFieldWidget")
            .field("template", &self.template)
            .field("classname", &self.classname)
            .field("render", &self.render.is_some())
            .finish()
    }
}

const BLOCK_OPEN: &str = "collapsable";
const BLOCK_CLOSED: &str = "collapsable closed";

/// Visual group of fields. The fields belong to the enclosing container:
/// their input names carry no block prefix.
#[derive(Debug, Clone)]
pub struct FieldBlock {
    title: String,
    items: Vec<Item>,
    template: String,
    classname: Option<String>,
    opened: bool,
    open_with_data: bool,
    media: Media,
}

impl FieldBlock {
    pub fn new(title: &str, items: Vec<Item>) -> Self {
        Self {
            title: title.to_owned(),
            items,
            template: "widgets/collapsable_block".to_owned(),
            classname: None,
            opened: true,
            open_with_data: false,
            media: Media::new(),
        }
    }

    /// Fixed class name instead of the computed open/closed one.
    pub fn with_classname(mut self, classname: &str) -> Self {
        self.classname = Some(classname.to_owned());
        self
    }

    pub fn closed(mut self) -> Self {
        self.opened = false;
        self
    }

    /// A closed block opens when any of its fields carries data.
    pub fn opened_with_data(mut self) -> Self {
        self.open_with_data = true;
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_owned();
        self
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    /// `has_data` tells whether the named field holds a truthy value.
    pub fn resolve_classname<F: Fn(&str) -> bool>(&self, has_data: F) -> String {
        if let Some(classname) = &self.classname {
            return classname.clone();
        }
        if self.open_with_data || self.opened {
            for field in crate::field::flatten_fields(&self.items) {
                if self.opened || has_data(field.name()) {
                    return BLOCK_OPEN.to_owned();
                }
            }
        }
        BLOCK_CLOSED.to_owned()
    }
}
