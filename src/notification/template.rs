//! 模板替换：`{{name}}` -> 变量值
//!
//! 未提供的变量原样保留。

use super::model::Notification;
use std::collections::HashMap;

/// 替换文本中的 `{{key}}` 占位符（key 两侧允许空白）
pub fn render(template: &str, variables: &HashMap<String, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        match after_open.find("}}") {
            Some(end) => {
                let key = after_open[..end].trim();
                match variables.get(key) {
                    Some(value) => output.push_str(value),
                    None => output.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after_open[end + 2..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    output.push_str(rest);
    output
}

/// 对通知应用模板变量；没有变量时原样返回
pub fn apply(notification: Notification) -> Notification {
    let rendered = notification
        .template_variables()
        .filter(|vars| !vars.is_empty())
        .map(|vars| render(notification.message(), vars));

    match rendered {
        Some(message) => notification.with_message(message),
        None => notification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::model::Recipient;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_replaces_known_keys() {
        let out = render("Hi {{name}}, order {{ order_id }} shipped", &vars(&[("name", "Ada"), ("order_id", "42")]));
        assert_eq!(out, "Hi Ada, order 42 shipped");
    }

    #[test]
    fn test_render_keeps_unknown_and_unterminated() {
        assert_eq!(render("Hi {{name}} {{missing}}", &vars(&[("name", "Ada")])), "Hi Ada {{missing}}");
        assert_eq!(render("broken {{name", &vars(&[("name", "Ada")])), "broken {{name");
        assert_eq!(render("no placeholders", &HashMap::new()), "no placeholders");
    }

    #[test]
    fn test_render_repeated_key() {
        assert_eq!(render("{{x}}-{{x}}", &vars(&[("x", "1")])), "1-1");
    }

    #[test]
    fn test_apply_produces_new_notification() {
        let n = Notification::new(Recipient::new(), "Hello {{name}}").with_variable("name", "Grace");
        let id = n.id().to_string();

        let rendered = apply(n);
        assert_eq!(rendered.message(), "Hello Grace");
        assert_eq!(rendered.id(), id);
    }

    #[test]
    fn test_apply_without_variables() {
        let n = Notification::new(Recipient::new(), "Hello {{name}}");
        assert_eq!(apply(n).message(), "Hello {{name}}");
    }
}
