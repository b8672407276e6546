use fw_error::Result;
use fw_template::LiquidTemplates;

const ROWS_SLOT: &str = "[[rows]]";

/// Label, widget and error of every child, laid out by render type.
const ROWS: &str = r#"{% for child in children %}{% if child.render_type == "hidden" %}{{ child.html }}{% elsif child.render_type == "full-width" %}<div class="form-row">{{ child.html }}</div>{% else %}<div class="form-row{% if child.error %} error{% endif %}">{% if child.render_type == "checkbox" %}{{ child.html }}{% if child.label %}<label for="{{ child.id | escape }}">{{ child.label | escape }}</label>{% endif %}{% else %}{% if child.label %}<label for="{{ child.id | escape }}">{{ child.label | escape }}</label>{% endif %}{{ child.html }}{% endif %}{% if child.error %}<p class="error">{{ child.error | escape }}</p>{% endif %}</div>{% endif %}{% endfor %}"#;

const FORM: &str = r#"{{ media }}[[rows]]"#;

const TEXT_INPUT: &str = r#"<input type="text" id="{{ id | escape }}" name="{{ input_name | escape }}" value="{{ value | escape }}"{% if classname %} class="{{ classname | escape }}"{% endif %}{% if readonly %} readonly="readonly"{% endif %}/>"#;

const TEXTAREA: &str = r#"<textarea id="{{ id | escape }}" name="{{ input_name | escape }}"{% if classname %} class="{{ classname | escape }}"{% endif %}{% if readonly %} readonly="readonly"{% endif %}>{{ value | escape }}</textarea>"#;

const HIDDEN_INPUT: &str = r#"{% if multiple %}{% for item in value %}<input type="hidden" name="{{ input_name | escape }}" value="{{ item | escape }}"/>{% endfor %}{% else %}<input type="hidden" id="{{ id | escape }}" name="{{ input_name | escape }}" value="{{ value | escape }}"/>{% endif %}"#;

const PASSWORD_INPUT: &str = r#"<input type="password" id="{{ id | escape }}" name="{{ input_name | escape }}"{% if classname %} class="{{ classname | escape }}"{% endif %}{% if readonly %} readonly="readonly"{% endif %}/>"#;

const CHECKBOX: &str = r#"<input type="checkbox" id="{{ id | escape }}" name="{{ input_name | escape }}" value="checked"{% if value != "" %} checked="checked"{% endif %}{% if readonly %} disabled="disabled"{% endif %}/>"#;

const SELECT: &str = r#"<select id="{{ id | escape }}" name="{{ input_name | escape }}"{% if classname %} class="{{ classname | escape }}"{% endif %}{% if multiple %} multiple="multiple"{% endif %}{% if size %} size="{{ size | escape }}"{% endif %}{% if readonly %} disabled="disabled"{% endif %} data-required="{{ required }}">{% for option in options %}<option value="{{ option.value | escape }}"{% if option.selected %} selected="selected"{% endif %}>{{ option.title | escape }}</option>{% endfor %}</select>"#;

const SELECT_CHECKBOX: &str = r#"<ul id="{{ id | escape }}"{% if classname %} class="{{ classname | escape }}"{% endif %} data-required="{{ required }}">{% for option in options %}<li><input type="{% if multiple %}checkbox{% else %}radio{% endif %}" id="{{ id | escape }}-{{ forloop.index }}" name="{{ input_name | escape }}" value="{{ option.value | escape }}"{% if option.selected %} checked="checked"{% endif %}{% if readonly %} disabled="disabled"{% endif %}/><label for="{{ id | escape }}-{{ forloop.index }}">{{ option.title | escape }}</label></li>{% endfor %}</ul>"#;

const SPAN: &str = r#"<span id="{{ id | escape }}"{% if classname %} class="{{ classname | escape }}"{% endif %}>{% if should_escape %}{{ value | escape }}{% else %}{{ value }}{% endif %}</span>"#;

const FILE: &str = r#"<input type="file" id="{{ id | escape }}" name="{{ input_name | escape }}"{% if readonly %} disabled="disabled"{% endif %}/>"#;

const FIELD_SET: &str = r#"<fieldset id="{{ id | escape }}"{% if classname %} class="{{ classname | escape }}"{% endif %}>[[rows]]</fieldset>"#;

const FIELD_LIST: &str = r#"<div id="{{ id | escape }}" class="fieldlist{% if classname %} {{ classname | escape }}{% endif %}" data-input-name="{{ input_name | escape }}">{% for index in indices %}<input type="hidden" name="{{ input_name | escape }}-indices" value="{{ index | escape }}"/>{% endfor %}{% for child in children %}<div class="fieldlist-item" data-index="{{ child.index | escape }}">{{ child.html }}{% if child.error %}<p class="error">{{ child.error | escape }}</p>{% endif %}</div>{% endfor %}{% unless readonly %}<script type="text/template" class="fieldlist-template">{{ item_template }}</script><button type="button" class="fieldlist-add">+</button>{% endunless %}</div>"#;

const COLLAPSABLE_BLOCK: &str = r#"<div class="{{ classname | escape }}">{% if title %}<h2>{{ title | escape }}</h2>{% endif %}[[rows]]</div>"#;

/// Template names widgets and forms refer to by default.
pub const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("forms/default", FORM),
    ("widgets/textinput", TEXT_INPUT),
    ("widgets/textarea", TEXTAREA),
    ("widgets/hiddeninput", HIDDEN_INPUT),
    ("widgets/passwordinput", PASSWORD_INPUT),
    ("widgets/checkbox", CHECKBOX),
    ("widgets/select", SELECT),
    ("widgets/select-checkbox", SELECT_CHECKBOX),
    ("widgets/span", SPAN),
    ("widgets/file", FILE),
    ("widgets/fieldset", FIELD_SET),
    ("widgets/fieldlist", FIELD_LIST),
    ("widgets/collapsable_block", COLLAPSABLE_BLOCK),
];

pub fn register_defaults(templates: &LiquidTemplates) -> Result<()> {
    for (name, source) in DEFAULT_TEMPLATES {
        templates.register(name, &source.replace(ROWS_SLOT, ROWS))?;
    }
    fw_log::debug(
        None,
        format!("[Forms] Registered {} default templates", DEFAULT_TEMPLATES.len()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use fw_template::TemplateEngine;
    use serde_json::json;

    use super::*;

    fn templates() -> LiquidTemplates {
        let templates = LiquidTemplates::new().unwrap();
        register_defaults(&templates).unwrap();
        templates
    }

    #[test]
    fn registers_every_default() {
        let templates = templates();
        for (name, _) in DEFAULT_TEMPLATES {
            assert!(templates.has_template(name), "{name} is missing");
        }
    }

    #[test]
    fn rows_follow_render_type() {
        let templates = templates();
        let html = templates
            .render(
                "widgets/collapsable_block",
                &json!({
                    "title": "Block",
                    "classname": "collapsable",
                    "children": [
                        {
                            "html": "<i>hidden</i>",
                            "render_type": "hidden",
                            "id": "f-a",
                            "label": "A",
                            "error": null,
                        },
                        {
                            "html": "<i>text</i>",
                            "render_type": "default",
                            "id": "f-b",
                            "label": "B",
                            "error": "required field",
                        },
                    ],
                }),
            )
            .unwrap();

        assert!(html.starts_with("<div class=\"collapsable\"><h2>Block</h2><i>hidden</i>"));
        assert!(html.contains(
            "<div class=\"form-row error\"><label for=\"f-b\">B</label><i>text</i><p class=\"error\">required field</p></div>"
        ));
    }
}
