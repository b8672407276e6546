use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    conv::{Char, Conv, Converter, ListConv, MapConv, SimpleFile},
    media::Media,
    perm::FieldPerm,
    value::Value,
    widget::{FieldBlock, NoFieldWidget, Widget},
};

#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Atomic field backed by one or more text inputs.
    Scalar,
    File,
    /// Fixed set of differently named children.
    Set(Vec<Item>),
    /// Variable number of copies of one field, named by index.
    List(Box<Field>),
}

/// Node of a form tree.
#[derive(Debug, Clone)]
pub enum Item {
    Field(Field),
    Block(FieldBlock),
    Widget(NoFieldWidget),
}

impl From<Field> for Item {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<FieldBlock> for Item {
    fn from(block: FieldBlock) -> Self {
        Self::Block(block)
    }
}

impl From<NoFieldWidget> for Item {
    fn from(widget: NoFieldWidget) -> Self {
        Self::Widget(widget)
    }
}

/// Something a container renders, in declaration order.
#[derive(Debug, Clone, Copy)]
pub enum WidgetRef<'a> {
    Field(&'a Field, &'a Widget),
    Block(&'a FieldBlock),
    NoField(&'a NoFieldWidget),
}

impl WidgetRef<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Field(_, widget) => widget.kind().name(),
            Self::Block(_) => "FieldBlock",
            Self::NoField(_) => "NoFieldWidget",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    conv: Conv,
    widget: Option<Widget>,
    label: Option<String>,
    perm: FieldPerm,
    initial: Option<Value>,
    media: Media,
}

impl Field {
    fn with_kind(name: &str, kind: FieldKind, conv: Conv, widget: Widget) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            conv,
            widget: Some(widget),
            label: None,
            perm: FieldPerm::default(),
            initial: None,
            media: Media::new(),
        }
    }

    /// Text field: `Char` converter rendered as a text input.
    pub fn new(name: &str) -> Self {
        Self::with_kind(
            name,
            FieldKind::Scalar,
            Arc::new(Char::new()),
            Widget::text_input(),
        )
    }

    pub fn file(name: &str) -> Self {
        Self::with_kind(
            name,
            FieldKind::File,
            Arc::new(SimpleFile::new()),
            Widget::file_input(),
        )
    }

    pub fn set(name: &str, items: Vec<Item>) -> Self {
        Self::with_kind(
            name,
            FieldKind::Set(items),
            Arc::new(MapConv::new()),
            Widget::field_set(),
        )
    }

    pub fn list(name: &str, field: Field) -> Self {
        Self::with_kind(
            name,
            FieldKind::List(Box::new(field)),
            Arc::new(ListConv::new()),
            Widget::field_list(),
        )
    }

    pub fn with_conv(mut self, conv: impl Converter + 'static) -> Self {
        self.conv = Arc::new(conv);
        self
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widget = Some(widget);
        self
    }

    /// The field still takes part in accept, it just renders nothing.
    pub fn without_widget(mut self) -> Self {
        self.widget = None;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_owned());
        self
    }

    pub fn with_perm(mut self, perm: impl Into<FieldPerm>) -> Self {
        self.perm = perm.into();
        self
    }

    pub fn with_initial(mut self, initial: impl Into<Value>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    /// Copy of this field under another name.
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn conv(&self) -> &Conv {
        &self.conv
    }

    pub fn widget(&self) -> Option<&Widget> {
        self.widget.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn perm(&self) -> &FieldPerm {
        &self.perm
    }

    pub fn multiple(&self) -> bool {
        self.conv.multiple()
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, FieldKind::Set(_) | FieldKind::List(_))
    }

    /// Children of a field set, block members included.
    pub fn fields(&self) -> Vec<&Field> {
        match &self.kind {
            FieldKind::Set(items) => flatten_fields(items),
            _ => Vec::new(),
        }
    }

    pub fn widgets(&self) -> Vec<WidgetRef<'_>> {
        match &self.kind {
            FieldKind::Set(items) => collect_widgets(items),
            _ => Vec::new(),
        }
    }

    /// Item field of a field list.
    pub fn item(&self) -> Option<&Field> {
        match &self.kind {
            FieldKind::List(field) => Some(field),
            _ => None,
        }
    }

    /// Looks a descendant up by dotted path relative to this field.
    pub fn get_field(&self, path: &str) -> Option<&Field> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let child = match &self.kind {
            FieldKind::Set(items) => find_field(items, head)?,
            FieldKind::List(field) if is_index(head) => field.as_ref(),
            _ => return None,
        };

        match rest {
            Some(rest) => child.get_field(rest),
            None => Some(child),
        }
    }

    pub fn get_initial(&self) -> Value {
        if let Some(initial) = &self.initial {
            return initial.clone();
        }
        match &self.kind {
            FieldKind::Scalar | FieldKind::File => match self.multiple() {
                true => Value::List(Vec::new()),
                false => Value::Null,
            },
            FieldKind::Set(items) => {
                let value = Value::Map(
                    flatten_fields(items)
                        .into_iter()
                        .map(|field| (field.name.clone(), field.get_initial()))
                        .collect::<IndexMap<_, _>>(),
                );
                self.conv.accept(&value).unwrap_or(value)
            }
            FieldKind::List(_) => Value::List(Vec::new()),
        }
    }

    pub fn get_media(&self) -> Media {
        let mut media = self.media.clone();
        if let Some(widget) = &self.widget {
            media += widget.media();
        }
        match &self.kind {
            FieldKind::Set(items) => media += &items_media(items),
            FieldKind::List(field) => media += &field.get_media(),
            FieldKind::Scalar | FieldKind::File => {}
        }
        media
    }
}

pub(crate) fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn find_field<'a>(items: &'a [Item], name: &str) -> Option<&'a Field> {
    flatten_fields(items)
        .into_iter()
        .find(|field| field.name == name)
}

/// Fields of a container in order, descending into blocks.
pub fn flatten_fields(items: &[Item]) -> Vec<&Field> {
    let mut fields = Vec::new();
    for item in items {
        match item {
            Item::Field(field) => fields.push(field),
            Item::Block(block) => fields.extend(flatten_fields(block.items())),
            Item::Widget(_) => {}
        }
    }
    fields
}

/// Widgets of a container in order; blocks stay whole, fields without a
/// widget are skipped.
pub fn collect_widgets(items: &[Item]) -> Vec<WidgetRef<'_>> {
    items
        .iter()
        .filter_map(|item| match item {
            Item::Field(field) => field
                .widget
                .as_ref()
                .map(|widget| WidgetRef::Field(field, widget)),
            Item::Block(block) => Some(WidgetRef::Block(block)),
            Item::Widget(widget) => Some(WidgetRef::NoField(widget)),
        })
        .collect()
}

pub(crate) fn items_media(items: &[Item]) -> Media {
    let mut media = Media::new();
    for item in items {
        match item {
            Item::Field(field) => media += &field.get_media(),
            Item::Block(block) => {
                media += block.media();
                media += &items_media(block.items());
            }
            Item::Widget(widget) => media += widget.media(),
        }
    }
    media
}
