use indexmap::IndexMap;
use serde::Serialize;

use fw_error::Result;
use fw_template::TemplateEngine;

use crate::{
    field::{self, Field, FieldKind, Item, WidgetRef},
    media::Media,
    multidict::{MultiDict, RawValue},
    perm::Perms,
    value::Value,
    widget::{FieldBlock, NoFieldWidget, RenderType, Widget, WidgetKind},
};

pub const INCOMPATIBLE_TYPE_MESSAGE: &str = "Given value has incompatible type";
pub const NOT_FILE_MESSAGE: &str = "Given value is not file";

pub type Errors = IndexMap<String, String>;

/// Root of a form tree plus the state of one submission: raw data as
/// posted, converted (python) data and errors keyed by input name.
#[derive(Debug, Clone)]
pub struct Form {
    id: String,
    items: Vec<Item>,
    permissions: Perms,
    template: String,
    media: Media,
    initial: IndexMap<String, Value>,
    python_data: IndexMap<String, Value>,
    raw_data: MultiDict,
    errors: Errors,
}

impl Form {
    pub fn new(items: Vec<Item>) -> Self {
        let mut form = Self {
            id: String::new(),
            items,
            permissions: Perms::RW,
            template: "forms/default".to_owned(),
            media: Media::new(),
            initial: IndexMap::new(),
            python_data: IndexMap::new(),
            raw_data: MultiDict::new(),
            errors: Errors::new(),
        };
        form.reset();
        form
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_owned();
        self
    }

    /// Values not given fall back to each field's own initial value.
    pub fn with_initial(mut self, initial: IndexMap<String, Value>) -> Self {
        self.initial = initial;
        self.reset();
        self
    }

    pub fn with_permissions(mut self, permissions: Perms) -> Self {
        self.permissions = permissions;
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

    fn reset(&mut self) {
        self.python_data.clear();
        self.raw_data = MultiDict::new();
        self.errors.clear();

        for field in field::flatten_fields(&self.items) {
            let value = self
                .initial
                .get(field.name())
                .cloned()
                .unwrap_or_else(|| field.get_initial());
            set_raw_value(
                field,
                field.name(),
                &field.conv().from_python(&value),
                &mut self.raw_data,
            );
            self.python_data.insert(field.name().to_owned(), value);
        }
    }

    /// Binds submitted data. Returns whether the form is valid.
    ///
    /// Writable fields are converted into python data; read-only fields get
    /// their raw values rewritten from the python data they already hold.
    pub fn accept(&mut self, data: MultiDict) -> bool {
        self.raw_data = data;
        self.errors.clear();

        for field in field::flatten_fields(&self.items) {
            let perms = field.perm().resolve(field.name(), self.permissions);
            let current = self
                .python_data
                .get(field.name())
                .cloned()
                .unwrap_or_else(|| field.get_initial());

            if perms.writable() {
                let value = accept_field(
                    field,
                    field.name(),
                    "",
                    self.permissions,
                    &current,
                    &mut self.raw_data,
                    &mut self.errors,
                );
                self.python_data.insert(field.name().to_owned(), value);
            } else {
                set_raw_value(
                    field,
                    field.name(),
                    &field.conv().from_python(&current),
                    &mut self.raw_data,
                );
            }
        }

        if !self.errors.is_empty() {
            fw_log::debug(
                None,
                format!("[Form] Rejected submission with {} error(s)", self.errors.len()),
            );
        }

        self.is_valid()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn permissions(&self) -> Perms {
        self.permissions
    }

    pub fn python_data(&self) -> &IndexMap<String, Value> {
        &self.python_data
    }

    pub fn raw_data(&self) -> &MultiDict {
        &self.raw_data
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    pub fn error(&self, input_name: &str) -> Option<&str> {
        self.errors.get(input_name).map(String::as_str)
    }

    pub fn fields(&self) -> Vec<&Field> {
        field::flatten_fields(&self.items)
    }

    pub fn widgets(&self) -> Vec<WidgetRef<'_>> {
        field::collect_widgets(&self.items)
    }

    /// Looks a field up by its dotted input name, e.g. `"tags.2.title"`.
    pub fn get_field(&self, path: &str) -> Option<BoundField<'_>> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let mut field = field::find_field(&self.items, head)?;
        let mut input_name = head.to_owned();
        let mut perms = field.perm().resolve(&input_name, self.permissions);

        for segment in segments {
            field = match field.kind() {
                FieldKind::Set(items) => field::find_field(items, segment)?,
                FieldKind::List(item) if field::is_index(segment) => item.as_ref(),
                _ => return None,
            };
            input_name = format!("{input_name}.{segment}");
            perms = field.perm().resolve(&input_name, perms);
        }

        Some(BoundField {
            field,
            input_name,
            perms,
        })
    }

    /// Python value under a dotted path; list items are addressed `1..=n`.
    pub fn clean_value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut value = self.python_data.get(segments.next()?)?;
        for segment in segments {
            value = match value {
                Value::Map(map) => map.get(segment)?,
                Value::List(items) => {
                    let index = segment.parse::<usize>().ok()?;
                    items.get(index.checked_sub(1)?)?
                }
                _ => return None,
            };
        }
        Some(value)
    }

    pub fn get_media(&self) -> Media {
        self.media.clone() + &field::items_media(&self.items)
    }

    pub fn render(&self, engine: &dyn TemplateEngine) -> Result<String> {
        let ctx = RenderCtx {
            form_id: &self.id,
            raw: &self.raw_data,
            errors: &self.errors,
            engine,
        };
        let python_data = Value::Map(self.python_data.clone());
        let children = render_items(&self.items, "", self.permissions, Some(&python_data), &ctx)?;

        let context = FormContext {
            id: &self.id,
            children,
            media: self.get_media().render(),
            errors: &self.errors,
            is_valid: self.is_valid(),
        };
        engine.render(&self.template, &to_json(&context)?)
    }
}

/// A field located inside a form, with its absolute input name and
/// effective permissions.
#[derive(Debug, Clone)]
pub struct BoundField<'a> {
    field: &'a Field,
    input_name: String,
    perms: Perms,
}

impl<'a> BoundField<'a> {
    pub fn field(&self) -> &'a Field {
        self.field
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn perms(&self) -> Perms {
        self.perms
    }

    pub fn readable(&self) -> bool {
        self.perms.readable()
    }

    pub fn writable(&self) -> bool {
        self.perms.writable()
    }
}

fn child_input_name(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

fn indices_input_name(input_name: &str) -> String {
    format!("{input_name}-indices")
}

/// Submitted item indices of a list field. Anything but plain digits is
/// logged and dropped, so accept and render see the same items.
fn list_indices(raw: &MultiDict, input_name: &str) -> Vec<String> {
    raw.get_all(&indices_input_name(input_name))
        .into_iter()
        .filter_map(RawValue::as_text)
        .filter(|index| {
            let valid = field::is_index(index);
            if !valid {
                fw_log::warn(
                    None,
                    format!("[Form] Got incorrect index from form: {index:?}"),
                );
            }
            valid
        })
        .map(str::to_owned)
        .collect()
}

/// Reads the raw submission of an atomic field, recording a type error
/// and falling back to the null value on mismatch.
fn read_raw(field: &Field, input_name: &str, raw: &MultiDict, errors: &mut Errors) -> Value {
    let is_file = matches!(field.kind(), FieldKind::File);
    let accepts = |value: &RawValue| match (is_file, value) {
        (false, RawValue::Text(_)) | (true, RawValue::File(_)) => true,
        (true, RawValue::Text(text)) => text.is_empty(),
        (false, RawValue::File(_)) => false,
    };
    let to_value = |value: &RawValue| match value {
        RawValue::Text(text) if is_file && text.is_empty() => Value::Null,
        other => other.to_value(),
    };
    let message = match is_file {
        true => NOT_FILE_MESSAGE,
        false => INCOMPATIBLE_TYPE_MESSAGE,
    };

    if field.multiple() {
        let values = raw.get_all(input_name);
        if values.iter().any(|&value| !accepts(value)) {
            errors.insert(input_name.to_owned(), message.to_owned());
            return Value::List(Vec::new());
        }
        return Value::List(values.into_iter().map(to_value).collect());
    }

    match raw.get(input_name) {
        Some(value) if accepts(value) => to_value(value),
        Some(_) => {
            errors.insert(input_name.to_owned(), message.to_owned());
            null_value(is_file)
        }
        None => null_value(is_file),
    }
}

fn null_value(is_file: bool) -> Value {
    match is_file {
        true => Value::Null,
        false => Value::from(""),
    }
}

/// Converts the submission of a writable field. On a validation error the
/// message is stored under the field's input name and `current` is kept.
fn accept_field(
    field: &Field,
    name: &str,
    prefix: &str,
    parent_perms: Perms,
    current: &Value,
    raw: &mut MultiDict,
    errors: &mut Errors,
) -> Value {
    let input_name = child_input_name(prefix, name);
    let perms = field.perm().resolve(&input_name, parent_perms);

    let value = match field.kind() {
        FieldKind::Scalar | FieldKind::File => read_raw(field, &input_name, raw, errors),
        FieldKind::Set(items) => {
            let child_prefix = format!("{input_name}.");
            let mut result = match field.conv().from_python(current) {
                Value::Map(map) => map,
                _ => IndexMap::new(),
            };

            for child in field::flatten_fields(items) {
                let child_input_name = child_input_name(&child_prefix, child.name());
                let child_perms = child.perm().resolve(&child_input_name, perms);
                let child_current = result
                    .get(child.name())
                    .cloned()
                    .unwrap_or_else(|| child.get_initial());

                if child_perms.writable() {
                    let value = accept_field(
                        child,
                        child.name(),
                        &child_prefix,
                        perms,
                        &child_current,
                        raw,
                        errors,
                    );
                    result.insert(child.name().to_owned(), value);
                } else {
                    set_raw_value(
                        child,
                        &child_input_name,
                        &child.conv().from_python(&child_current),
                        raw,
                    );
                    result.insert(child.name().to_owned(), child_current);
                }
            }
            Value::Map(result)
        }
        FieldKind::List(item) => {
            let item_prefix = format!("{input_name}.");
            let old = field.conv().from_python(current);
            let mut result = IndexMap::new();
            for index in list_indices(raw, &input_name) {
                let item_input_name = child_input_name(&item_prefix, &index);
                let item_perms = item.perm().resolve(&item_input_name, perms);
                let item_old = old.get(&index);

                if item_perms.writable() {
                    let item_current = item_old.cloned().unwrap_or_else(|| item.get_initial());
                    let value = accept_field(
                        item,
                        &index,
                        &item_prefix,
                        perms,
                        &item_current,
                        raw,
                        errors,
                    );
                    result.insert(index, value);
                } else if let Some(value) = item_old {
                    result.insert(index, value.clone());
                }
            }
            Value::Map(result)
        }
    };

    match field.conv().accept(&value) {
        Ok(value) => value,
        Err(err) => {
            errors.insert(input_name, err.message().to_owned());
            current.clone()
        }
    }
}

/// Writes `value` (already passed through `from_python`) into raw data.
pub(crate) fn set_raw_value(field: &Field, input_name: &str, value: &Value, raw: &mut MultiDict) {
    match field.kind() {
        FieldKind::Scalar => match value {
            Value::List(values) => {
                raw.remove(input_name);
                for value in values {
                    raw.add(input_name, value.to_raw_string());
                }
            }
            _ if field.multiple() => {
                raw.remove(input_name);
            }
            other => raw.set(input_name, other.to_raw_string()),
        },
        FieldKind::File => {}
        FieldKind::Set(items) => {
            for child in field::flatten_fields(items) {
                let child_value = value.get(child.name()).cloned().unwrap_or_default();
                set_raw_value(
                    child,
                    &format!("{input_name}.{}", child.name()),
                    &child.conv().from_python(&child_value),
                    raw,
                );
            }
        }
        FieldKind::List(item) => {
            let indices_name = indices_input_name(input_name);
            raw.remove(&indices_name);

            let values: Vec<&Value> = match value {
                Value::Map(map) => map.values().collect(),
                Value::List(items) => items.iter().collect(),
                _ => Vec::new(),
            };
            for (i, item_value) in values.into_iter().enumerate() {
                let index = (i + 1).to_string();
                set_raw_value(
                    item,
                    &format!("{input_name}.{index}"),
                    &item.conv().from_python(item_value),
                    raw,
                );
                raw.add(&indices_name, index);
            }
        }
    }
}

struct RenderCtx<'a> {
    form_id: &'a str,
    raw: &'a MultiDict,
    errors: &'a Errors,
    engine: &'a dyn TemplateEngine,
}

impl RenderCtx<'_> {
    fn id(&self, input_name: &str) -> String {
        format!("{}-{}", self.form_id, input_name)
    }
}

#[derive(Serialize)]
struct FormContext<'a> {
    id: &'a str,
    children: Vec<Rendered>,
    media: String,
    errors: &'a Errors,
    is_valid: bool,
}

/// A rendered widget as its container sees it.
#[derive(Debug, Serialize)]
struct Rendered {
    html: String,
    id: String,
    input_name: Option<String>,
    label: Option<String>,
    error: Option<String>,
    render_type: RenderType,
    index: Option<String>,
}

#[derive(Serialize)]
struct SelectOption {
    value: String,
    title: String,
    selected: bool,
}

#[derive(Serialize)]
struct WidgetContext<'a> {
    widget: &'static str,
    template: &'a str,
    classname: Option<&'a str>,
    render_type: RenderType,
    id: String,
    input_name: &'a str,
    label: Option<&'a str>,
    error: Option<&'a str>,
    multiple: bool,
    readonly: bool,
    value: Value,
    options: Option<Vec<SelectOption>>,
    required: Option<&'static str>,
    size: Option<u32>,
    should_escape: Option<bool>,
    children: Vec<Rendered>,
    indices: Vec<String>,
    item_template: Option<String>,
}

#[derive(Serialize)]
struct BlockContext<'a> {
    title: Option<&'a str>,
    classname: String,
    children: Vec<Rendered>,
}

#[derive(Serialize)]
struct NoFieldContext<'a> {
    template: &'a str,
    classname: Option<&'a str>,
}

fn to_json<T: Serialize>(context: &T) -> Result<serde_json::Value> {
    serde_json::to_value(context)
        .map_err(|err| fw_error::Error::Template(format!("Unserializable context: {err}")))
}

fn render_items(
    items: &[Item],
    prefix: &str,
    perms: Perms,
    data: Option<&Value>,
    ctx: &RenderCtx<'_>,
) -> Result<Vec<Rendered>> {
    let mut rendered = Vec::new();
    for widget in field::collect_widgets(items) {
        let child = match widget {
            WidgetRef::Field(field, widget) => {
                let field_data = data.and_then(|data| data.get(field.name()));
                render_field(field, widget, field.name(), prefix, perms, field_data, None, ctx)?
            }
            WidgetRef::Block(block) => Some(render_block(block, prefix, perms, data, ctx)?),
            WidgetRef::NoField(widget) => Some(render_no_field(widget, ctx)?),
        };
        rendered.extend(child);
    }
    Ok(rendered)
}

fn select_options(field: &Field, widget: &Widget, value: &Value) -> Option<Vec<SelectOption>> {
    let null_label = match widget.kind() {
        WidgetKind::Select { null_label, .. } | WidgetKind::CheckBoxSelect { null_label } => {
            null_label
        }
        _ => return None,
    };

    let selected: Vec<String> = match value {
        Value::List(values) => values.iter().map(Value::to_raw_string).collect(),
        single => vec![single.to_raw_string()],
    };

    let mut options = Vec::new();
    let empty = selected.iter().all(String::is_empty);
    if !field.multiple() && (empty || !field.conv().required()) {
        options.push(SelectOption {
            value: String::new(),
            title: null_label.clone(),
            selected: empty,
        });
    }
    for (choice, title) in field.conv().choices().unwrap_or_default() {
        options.push(SelectOption {
            selected: selected.contains(&choice),
            value: choice,
            title,
        });
    }
    Some(options)
}

#[allow(clippy::too_many_arguments)]
fn render_field(
    field: &Field,
    widget: &Widget,
    name: &str,
    prefix: &str,
    parent_perms: Perms,
    data: Option<&Value>,
    index: Option<&str>,
    ctx: &RenderCtx<'_>,
) -> Result<Option<Rendered>> {
    let input_name = child_input_name(prefix, name);
    let perms = field.perm().resolve(&input_name, parent_perms);
    if !perms.readable() {
        return Ok(None);
    }

    let value = match field.kind() {
        FieldKind::Scalar => match field.multiple() {
            true => Value::List(
                ctx.raw
                    .get_all(&input_name)
                    .into_iter()
                    .map(RawValue::to_value)
                    .collect(),
            ),
            false => ctx
                .raw
                .get(&input_name)
                .map(RawValue::to_value)
                .unwrap_or_else(|| Value::from("")),
        },
        FieldKind::File | FieldKind::Set(_) | FieldKind::List(_) => Value::Null,
    };

    let mut context = WidgetContext {
        widget: widget.kind().name(),
        template: widget.template(),
        classname: widget.classname(),
        render_type: widget.render_type(),
        id: ctx.id(&input_name),
        input_name: &input_name,
        label: field.label(),
        error: ctx.errors.get(&input_name).map(String::as_str),
        multiple: field.multiple(),
        readonly: !perms.writable(),
        options: select_options(field, widget, &value),
        required: None,
        size: None,
        should_escape: None,
        value,
        children: Vec::new(),
        indices: Vec::new(),
        item_template: None,
    };

    match widget.kind() {
        WidgetKind::Select { size, .. } => {
            context.size = *size;
            context.required = Some(required_flag(field));
        }
        WidgetKind::CheckBoxSelect { .. } => {
            context.required = Some(required_flag(field));
        }
        WidgetKind::CharDisplay { escape, getter } => {
            context.should_escape = Some(*escape);
            if let Some(getter) = getter {
                context.value = Value::Str(getter(&context.value.to_raw_string()));
            }
        }
        _ => {}
    }

    match field.kind() {
        FieldKind::Set(items) => {
            let child_prefix = format!("{input_name}.");
            context.children = render_items(items, &child_prefix, perms, data, ctx)?;
        }
        FieldKind::List(item) => {
            let item_prefix = format!("{input_name}.");
            let indices = list_indices(ctx.raw, &input_name);

            if let Some(item_widget) = item.widget() {
                for index in &indices {
                    let item_data = data.and_then(|data| match data {
                        Value::List(values) => values
                            .get(index.parse::<usize>().ok()?.checked_sub(1)?),
                        _ => None,
                    });
                    let rendered = render_field(
                        item,
                        item_widget,
                        index,
                        &item_prefix,
                        perms,
                        item_data,
                        Some(index),
                        ctx,
                    )?;
                    context.children.extend(rendered);
                }
                context.item_template = render_item_template(item, item_widget, &input_name, perms, ctx)?;
            }
            context.indices = indices;
        }
        FieldKind::Scalar | FieldKind::File => {}
    }

    let html = ctx.engine.render(widget.template(), &to_json(&context)?)?;

    Ok(Some(Rendered {
        html,
        id: context.id,
        input_name: Some(input_name.clone()),
        label: field.label().map(str::to_owned),
        error: context.error.map(str::to_owned),
        render_type: widget.render_type(),
        index: index.map(str::to_owned),
    }))
}

/// Markup for a new list item, named `%{input_name}-index%` so client code
/// can substitute the next index.
fn render_item_template(
    item: &Field,
    item_widget: &Widget,
    input_name: &str,
    perms: Perms,
    ctx: &RenderCtx<'_>,
) -> Result<Option<String>> {
    let placeholder = format!("%{input_name}-index%");
    let item_prefix = format!("{input_name}.");
    let mut raw = ctx.raw.clone();
    set_raw_value(
        item,
        &child_input_name(&item_prefix, &placeholder),
        &item.conv().from_python(&item.get_initial()),
        &mut raw,
    );
    let template_ctx = RenderCtx {
        form_id: ctx.form_id,
        raw: &raw,
        errors: ctx.errors,
        engine: ctx.engine,
    };
    let rendered = render_field(
        item,
        item_widget,
        &placeholder,
        &item_prefix,
        perms,
        None,
        None,
        &template_ctx,
    )?;
    Ok(rendered.map(|rendered| rendered.html))
}

fn required_flag(field: &Field) -> &'static str {
    match field.conv().required() {
        true => "true",
        false => "false",
    }
}

fn render_block(
    block: &FieldBlock,
    prefix: &str,
    perms: Perms,
    data: Option<&Value>,
    ctx: &RenderCtx<'_>,
) -> Result<Rendered> {
    let classname = block.resolve_classname(|name| {
        data.and_then(|data| data.get(name))
            .is_some_and(Value::is_truthy)
    });
    let context = BlockContext {
        title: Some(block.title()).filter(|title| !title.is_empty()),
        classname,
        children: render_items(block.items(), prefix, perms, data, ctx)?,
    };
    let html = ctx.engine.render(block.template(), &to_json(&context)?)?;

    Ok(Rendered {
        html,
        id: String::new(),
        input_name: None,
        label: None,
        error: None,
        render_type: RenderType::FullWidth,
        index: None,
    })
}

fn render_no_field(widget: &NoFieldWidget, ctx: &RenderCtx<'_>) -> Result<Rendered> {
    let html = match widget.render_override() {
        Some(html) => html,
        None => {
            let context = NoFieldContext {
                template: widget.template(),
                classname: widget.classname(),
            };
            ctx.engine.render(widget.template(), &to_json(&context)?)?
        }
    };

    Ok(Rendered {
        html,
        id: String::new(),
        input_name: None,
        label: None,
        error: None,
        render_type: RenderType::FullWidth,
        index: None,
    })
}

#[cfg(test)]
mod tests {
    use fw_template::LiquidTemplates;

    use super::*;
    use crate::{
        conv::{Bool, Char, EnumChoice, Int, ListOf},
        templates,
        value::UploadedFile,
    };

    fn engine() -> LiquidTemplates {
        let engine = LiquidTemplates::new().unwrap();
        templates::register_defaults(&engine).unwrap();
        engine
    }

    fn data(query: &str) -> MultiDict {
        MultiDict::from_urlencoded(query)
    }

    fn profile() -> Form {
        Form::new(vec![
            Field::new("name").with_conv(Char::new().required()).into(),
            Field::new("age").with_conv(Int::new().min(0)).into(),
        ])
        .with_id("f")
    }

    #[test]
    fn accepts_valid_data() {
        let mut form = profile();
        assert!(form.accept(data("name=+John+&age=42")));
        assert_eq!(form.python_data()["name"], Value::from("John"));
        assert_eq!(form.python_data()["age"], Value::Int(42));
        assert!(form.errors().is_empty());
    }

    #[test]
    fn errors_keep_previous_clean_value() {
        let mut initial = IndexMap::new();
        initial.insert("name".to_owned(), Value::from("Old"));
        let mut form = profile().with_initial(initial);
        assert_eq!(form.raw_data().get_text("name"), Some("Old"));

        assert!(!form.accept(data("name=&age=abc")));
        assert_eq!(form.error("name"), Some("required field"));
        assert_eq!(form.error("age"), Some("it is not valid integer"));
        assert_eq!(form.python_data()["name"], Value::from("Old"));
        assert_eq!(form.raw_data().get_text("name"), Some(""));
    }

    #[test]
    fn read_only_fields_ignore_submission() {
        let mut form = Form::new(vec![
            Field::new("x")
                .with_perm(Perms::READ)
                .with_initial("keep")
                .into(),
            Field::new("y").into(),
        ]);
        assert!(form.accept(data("x=changed&y=new")));
        assert_eq!(form.python_data()["x"], Value::from("keep"));
        assert_eq!(form.raw_data().get_text("x"), Some("keep"));
        assert_eq!(form.python_data()["y"], Value::from("new"));
    }

    #[test]
    fn form_permissions_narrow_fields() {
        let mut form = Form::new(vec![Field::new("x").with_initial("a").into()])
            .with_permissions(Perms::READ);
        assert!(form.accept(data("x=b")));
        assert_eq!(form.python_data()["x"], Value::from("a"));
        assert!(!form.get_field("x").unwrap().writable());
    }

    #[test]
    fn field_set_children_use_dotted_names() {
        let mut form = Form::new(vec![Field::set(
            "person",
            vec![
                Field::new("first").into(),
                Field::new("age").with_conv(Int::new()).into(),
                Field::new("id").with_perm(Perms::READ).with_initial(7_i64).into(),
            ],
        )
        .into()]);
        assert!(form.accept(data("person.first=Ann&person.age=3&person.id=99")));
        assert_eq!(form.clean_value("person.first"), Some(&Value::from("Ann")));
        assert_eq!(form.clean_value("person.age"), Some(&Value::Int(3)));
        assert_eq!(form.clean_value("person.id"), Some(&Value::Int(7)));
        assert_eq!(form.raw_data().get_text("person.id"), Some("7"));

        assert!(!form.accept(data("person.age=x")));
        assert_eq!(form.error("person.age"), Some("it is not valid integer"));
        assert_eq!(form.clean_value("person.age"), Some(&Value::Int(3)));
    }

    #[test]
    fn field_list_follows_submitted_indices() {
        let mut form = Form::new(vec![Field::list("tags", Field::new("tag")).into()]);
        assert!(form.accept(data(
            "tags-indices=3&tags-indices=bad&tags-indices=1&tags.1=a&tags.3=b"
        )));
        assert_eq!(
            form.python_data()["tags"],
            Value::List(vec![Value::from("b"), Value::from("a")])
        );
        assert_eq!(form.clean_value("tags.2"), Some(&Value::from("a")));
        assert_eq!(form.clean_value("tags.3"), None);
        assert_eq!(form.clean_value("tags.0"), None);
    }

    #[test]
    fn field_list_initial_fills_raw_data() {
        let mut initial = IndexMap::new();
        initial.insert("tags".to_owned(), Value::from(vec!["a", "b"]));
        let form = Form::new(vec![Field::list("tags", Field::new("tag")).into()])
            .with_initial(initial);

        let indices: Vec<_> = form
            .raw_data()
            .get_all("tags-indices")
            .into_iter()
            .filter_map(RawValue::as_text)
            .collect();
        assert_eq!(indices, vec!["1", "2"]);
        assert_eq!(form.raw_data().get_text("tags.2"), Some("b"));
    }

    #[test]
    fn multiple_fields_read_every_value() {
        let mut form = Form::new(vec![Field::new("ids")
            .with_conv(ListOf::new(Int::new()))
            .into()]);
        assert!(form.accept(data("ids=1&ids=&ids=2")));
        assert_eq!(
            form.python_data()["ids"],
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn mismatched_raw_types_are_errors() {
        let mut form = Form::new(vec![
            Field::file("upload").into(),
            Field::new("title").into(),
        ]);

        let mut submitted = data("upload=text");
        submitted.add("title", UploadedFile::new("a.txt", None, b"a".to_vec()));
        assert!(!form.accept(submitted));
        assert_eq!(form.error("upload"), Some(NOT_FILE_MESSAGE));
        assert_eq!(form.error("title"), Some(INCOMPATIBLE_TYPE_MESSAGE));

        let mut submitted = MultiDict::new();
        submitted.add(
            "upload",
            UploadedFile::new("a.txt", Some("text/plain"), b"hello".to_vec()),
        );
        assert!(form.accept(submitted));
        let file = form.python_data()["upload"].as_file().unwrap();
        assert_eq!(file.filename, "a.txt");
        assert_eq!(file.size(), 5);
    }

    #[test]
    fn enum_choice_rejects_unknown_values() {
        let mut form = Form::new(vec![Field::new("color")
            .with_conv(EnumChoice::new([("r", "Red"), ("g", "Green")]))
            .into()]);
        assert!(!form.accept(data("color=b")));
        assert_eq!(form.error("color"), Some("no such value: b"));
        assert!(form.accept(data("color=g")));
        assert_eq!(form.python_data()["color"], Value::from("g"));
    }

    #[test]
    fn dynamic_permissions_see_input_names() {
        let mut form = Form::new(vec![Field::list(
            "items",
            Field::new("item").with_perm(crate::perm::FieldPerm::dynamic(|name: &str| {
                match name == "items.1" {
                    true => Perms::READ,
                    false => Perms::RW,
                }
            })),
        )
        .with_initial(Value::from(vec!["locked"]))
        .into()]);
        assert!(form.accept(data(
            "items-indices=1&items-indices=2&items.1=changed&items.2=new"
        )));
        assert_eq!(
            form.python_data()["items"],
            Value::from(vec!["locked", "new"])
        );
    }

    #[test]
    fn bound_fields_resolve_paths() {
        let form = Form::new(vec![Field::set(
            "person",
            vec![Field::new("age").with_perm(Perms::READ).into()],
        )
        .into()]);
        let bound = form.get_field("person.age").unwrap();
        assert_eq!(bound.input_name(), "person.age");
        assert!(bound.readable());
        assert!(!bound.writable());
        assert!(form.get_field("person.missing").is_none());
        assert!(form.get_field("nope").is_none());
    }

    #[test]
    fn renders_fields_with_errors() {
        let engine = engine();
        let mut form = profile();
        form.accept(data("name=&age=%3Cb%3E"));
        let html = form.render(&engine).unwrap();

        assert!(html.contains(r#"<input type="text" id="f-name" name="name" value="" class="textinput"/>"#));
        assert!(html.contains(r#"value="&lt;b&gt;""#));
        assert!(html.contains(r#"<p class="error">required field</p>"#));
        assert!(html.contains(r#"<p class="error">it is not valid integer</p>"#));
    }

    #[test]
    fn unreadable_fields_are_not_rendered() {
        let engine = engine();
        let form = Form::new(vec![
            Field::new("secret").with_perm(Perms::NONE).into(),
            NoFieldWidget::from_fn(|| "<hr/>".to_owned()).into(),
        ]);
        let html = form.render(&engine).unwrap();
        assert!(!html.contains("secret"));
        assert!(html.contains(r#"<div class="form-row"><hr/></div>"#));
    }

    #[test]
    fn select_has_null_option_when_optional() {
        let engine = engine();
        let mut form = Form::new(vec![Field::new("color")
            .with_conv(EnumChoice::new([("r", "Red"), ("g", "Green")]))
            .with_widget(Widget::select())
            .into()]);
        form.accept(data("color=g"));
        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"<option value="">--------</option>"#));
        assert!(html.contains(r#"<option value="g" selected="selected">Green</option>"#));
        assert!(html.contains(r#"data-required="false""#));

        let form = Form::new(vec![Field::new("color")
            .with_conv(EnumChoice::new([("r", "Red")]).required())
            .with_widget(Widget::select())
            .with_initial("r")
            .into()]);
        let html = form.render(&engine).unwrap();
        assert!(!html.contains("--------"));
        assert!(html.contains(r#"data-required="true""#));
    }

    #[test]
    fn checkbox_reflects_value() {
        let engine = engine();
        let mut form = Form::new(vec![Field::new("agree")
            .with_conv(Bool::new())
            .with_widget(Widget::checkbox())
            .into()]);
        assert!(form.accept(data("agree=checked")));
        assert_eq!(form.python_data()["agree"], Value::Bool(true));
        assert!(form.render(&engine).unwrap().contains(r#"checked="checked""#));

        assert!(form.accept(data("")));
        assert_eq!(form.python_data()["agree"], Value::Bool(false));
        assert!(!form.render(&engine).unwrap().contains(r#"checked="checked""#));
    }

    #[test]
    fn blocks_open_with_data() {
        let engine = engine();
        let mut form = Form::new(vec![FieldBlock::new(
            "More",
            vec![Field::new("note").into()],
        )
        .closed()
        .opened_with_data()
        .into()]);
        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"<div class="collapsable closed"><h2>More</h2>"#));

        form.accept(data("note=hi"));
        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"<div class="collapsable"><h2>More</h2>"#));
        assert!(html.contains(r#"name="note" value="hi""#));
    }

    #[test]
    fn field_list_renders_indices_and_item_template() {
        let engine = engine();
        let mut initial = IndexMap::new();
        initial.insert("tags".to_owned(), Value::from(vec!["a"]));
        let form = Form::new(vec![Field::list("tags", Field::new("tag")).into()])
            .with_id("f")
            .with_initial(initial);
        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"<input type="hidden" name="tags-indices" value="1"/>"#));
        assert!(html.contains(r#"name="tags.1" value="a""#));
        assert!(html.contains(r#"name="tags.%tags-index%""#));
    }

    #[test]
    fn field_list_skips_markup_in_indices() {
        let engine = engine();
        let mut form = Form::new(vec![Field::list("tags", Field::new("tag")).into()]).with_id("f");
        assert!(form.accept(data(
            "tags-indices=%22%3E%3Cscript%3Ealert(1)%3C%2Fscript%3E&tags-indices=1&tags.1=a"
        )));
        assert_eq!(form.python_data()["tags"], Value::from(vec!["a"]));

        let html = form.render(&engine).unwrap();
        assert!(!html.contains("alert(1)"));
        assert_eq!(html.matches(r#"name="tags-indices""#).count(), 1);
        assert_eq!(html.matches(r#"class="fieldlist-item""#).count(), 1);
        assert!(html.contains(r#"data-index="1""#));
    }

    #[test]
    fn attributes_are_escaped() {
        let engine = engine();
        let form = Form::new(vec![Field::new("name").into()]).with_id(r#"x"><b>"#);
        let html = form.render(&engine).unwrap();
        assert!(!html.contains("<b>"));
        assert!(html.contains(r#"id="x&quot;&gt;&lt;b&gt;-name""#));
    }

    #[test]
    fn char_display_applies_getter() {
        let engine = engine();
        let form = Form::new(vec![Field::new("name")
            .with_widget(Widget::char_display().with_getter(|value| format!("<b>{value}</b>")))
            .with_initial("x")
            .into()])
        .with_id("f");
        let html = form.render(&engine).unwrap();
        assert!(html.contains(
            r#"<span id="f-name" class="chardisplay">&lt;b&gt;x&lt;/b&gt;</span>"#
        ));

        let form = Form::new(vec![Field::new("name")
            .with_widget(
                Widget::char_display()
                    .with_escape(false)
                    .with_getter(|value| format!("<b>{value}</b>")),
            )
            .with_initial("x")
            .into()])
        .with_id("f");
        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"<span id="f-name" class="chardisplay"><b>x</b></span>"#));
    }

    #[test]
    fn checkbox_select_uses_radios_for_single_values() {
        let engine = engine();
        let form = Form::new(vec![Field::new("color")
            .with_conv(EnumChoice::new([("r", "Red"), ("g", "Green")]))
            .with_widget(Widget::checkbox_select())
            .with_initial("g")
            .into()])
        .with_id("f");
        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"type="radio""#));
        assert!(!html.contains(r#"type="checkbox""#));
        assert!(html.contains(r#"value="g" checked="checked""#));
        assert!(!html.contains(r#"value="r" checked="checked""#));
        assert!(html.contains(r#"data-required="false""#));
    }

    #[test]
    fn checkbox_select_uses_checkboxes_for_multiple_values() {
        let engine = engine();
        let mut form = Form::new(vec![Field::new("color")
            .with_conv(ListOf::new(EnumChoice::new([
                ("r", "Red"),
                ("g", "Green"),
                ("b", "Blue"),
            ])))
            .with_widget(Widget::checkbox_select())
            .into()])
        .with_id("f");
        assert!(form.accept(data("color=r&color=g")));
        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"type="checkbox""#));
        assert!(!html.contains(r#"type="radio""#));
        assert!(!html.contains("--------"));
        assert!(html.contains(r#"value="r" checked="checked""#));
        assert!(html.contains(r#"value="g" checked="checked""#));
        assert!(!html.contains(r#"value="b" checked="checked""#));
    }

    #[test]
    fn hidden_input_emits_every_value() {
        let engine = engine();
        let mut form = Form::new(vec![Field::new("ids")
            .with_conv(ListOf::new(Int::new()))
            .with_widget(Widget::hidden_input())
            .into()]);
        assert!(form.accept(data("ids=1&ids=2")));
        assert_eq!(form.python_data()["ids"], Value::List(vec![Value::Int(1), Value::Int(2)]));

        let html = form.render(&engine).unwrap();
        assert!(html.contains(r#"<input type="hidden" name="ids" value="1"/><input type="hidden" name="ids" value="2"/>"#));
        assert!(!html.contains("form-row"));
    }

    #[test]
    fn media_collects_from_widgets() {
        let form = Form::new(vec![Field::new("a")
            .with_widget(Widget::text_input().with_media(Media::new().with(crate::media::MediaAtom::js("/a.js"))))
            .into()])
        .with_media(Media::new().with(crate::media::MediaAtom::css("/form.css")));
        assert_eq!(form.get_media().atoms().len(), 2);
    }
}
