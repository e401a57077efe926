//! `package.json` editing that keeps the author's indentation

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Indentation used when none can be detected from the source text
pub const DEFAULT_INDENT: &str = "  ";

/// Longest indentation unit honoured (matches `JSON.stringify`)
const MAX_INDENT_LEN: usize = 10;

/// Detect the indentation unit of a JSON document.
///
/// Looks at the first line that starts with whitespace and contains a `"`.
/// The whitespace leading up to that quote is the unit.
pub fn detect_indent(text: &str) -> Option<String> {
    let line = text
        .split('\n')
        .find(|line| *line != line.trim_start() && line.contains('"'))?;

    let before_quote = &line[..line.find('"')?];
    let indent: String = before_quote
        .chars()
        .take_while(|c| c.is_whitespace())
        .take(MAX_INDENT_LEN)
        .collect();

    Some(indent)
}

/// A parsed `package.json` bound to its file path
#[derive(Debug, Clone)]
pub struct PackageJson {
    path: PathBuf,
    json: Value,
    indent: Option<String>,
    line_ending: &'static str,
    trailing_newline: bool,
}

impl PackageJson {
    /// Read and parse the file, remembering its indentation
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let json: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            json,
            indent: detect_indent(&text),
            line_ending: if text.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: text.ends_with('\n'),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn json_mut(&mut self) -> &mut Value {
        &mut self.json
    }

    /// Indentation detected in the source file, if any
    pub fn indent(&self) -> Option<&str> {
        self.indent.as_deref()
    }

    /// `"\r\n"` when the source file used CRLF line endings, otherwise `"\n"`
    pub fn line_ending(&self) -> &str {
        self.line_ending
    }

    /// The `name` field, if present and a string
    pub fn name(&self) -> Option<&str> {
        self.json.get("name").and_then(Value::as_str)
    }

    /// Set the `name` field, keeping its position when it already exists
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let object = self.json.as_object_mut().with_context(|| {
            format!("{} does not contain a JSON object", self.path.display())
        })?;
        object.insert("name".to_string(), Value::String(name.to_string()));
        Ok(())
    }

    /// Render the document with the detected (or default) indentation and line ending
    pub fn to_json_string(&self) -> Result<String> {
        let indent = self.indent.as_deref().unwrap_or(DEFAULT_INDENT);
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.json
            .serialize(&mut serializer)
            .context("Failed to serialize package.json")?;

        let mut text = String::from_utf8(buf).context("Serialized JSON is not valid UTF-8")?;
        // Newlines inside string values are escaped, so every raw `\n` is layout
        if self.line_ending != "\n" {
            text = text.replace('\n', self.line_ending);
        }
        if self.trailing_newline {
            text.push_str(self.line_ending);
        }
        Ok(text)
    }

    /// Overwrite the file with the current contents
    pub fn save(&self) -> Result<()> {
        let text = self.to_json_string()?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Read `path`, apply `mutate`, save, and return the handle
pub fn update_package_json<F>(path: impl AsRef<Path>, mutate: F) -> Result<PackageJson>
where
    F: FnOnce(&mut Value),
{
    let mut pkg = PackageJson::read(path)?;
    mutate(pkg.json_mut());
    pkg.save()?;
    Ok(pkg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TWO_SPACE: &str = "{\n  \"name\": \"template\",\n  \"version\": \"1.0.0\",\n  \"scripts\": {\n    \"dev\": \"node index.js\"\n  }\n}\n";

    #[test]
    fn test_detect_two_spaces() {
        assert_eq!(detect_indent(TWO_SPACE).as_deref(), Some("  "));
    }

    #[test]
    fn test_detect_tabs() {
        let text = "{\n\t\"name\": \"x\"\n}";
        assert_eq!(detect_indent(text).as_deref(), Some("\t"));
    }

    #[test]
    fn test_detect_skips_lines_without_quotes() {
        let text = "{\n  \"list\": [\n    1,\n    \"two\"\n  ]\n}";
        // The first indented line with a quote wins, not the deeper `1,` line
        assert_eq!(detect_indent(text).as_deref(), Some("  "));

        let text = "{\"a\": [\n      1\n], \"b\": {\n    \"c\": 2}}";
        assert_eq!(detect_indent(text).as_deref(), Some("    "));
    }

    #[test]
    fn test_detect_compact_is_none() {
        assert_eq!(detect_indent("{\"name\":\"x\"}"), None);
        assert_eq!(detect_indent(""), None);
    }

    #[test]
    fn test_detect_ignores_non_whitespace_prefix() {
        let text = "[\n  [\"a\"]\n]";
        assert_eq!(detect_indent(text).as_deref(), Some("  "));
    }

    #[test]
    fn test_round_trip_keeps_indent_and_order() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("package.json");
        std::fs::write(&file, TWO_SPACE).unwrap();

        let pkg = update_package_json(&file, |json| {
            json["version"] = json!("2.0.0");
        })
        .unwrap();

        let written = std::fs::read_to_string(&file).unwrap();
        assert_eq!(written, TWO_SPACE.replace("1.0.0", "2.0.0"));

        let reread = PackageJson::read(&file).unwrap();
        assert_eq!(reread.json(), pkg.json());
        assert_eq!(reread.indent(), Some("  "));
    }

    #[test]
    fn test_four_space_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("package.json");
        std::fs::write(&file, "{\n    \"name\": \"a\",\n    \"private\": true\n}").unwrap();

        let mut pkg = PackageJson::read(&file).unwrap();
        pkg.set_name("renamed").unwrap();
        pkg.save().unwrap();

        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "{\n    \"name\": \"renamed\",\n    \"private\": true\n}"
        );
    }

    #[test]
    fn test_compact_falls_back_to_default_indent() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("package.json");
        std::fs::write(&file, "{\"name\":\"a\",\"version\":\"1.0.0\"}").unwrap();

        let pkg = PackageJson::read(&file).unwrap();
        assert_eq!(pkg.indent(), None);
        assert_eq!(
            pkg.to_json_string().unwrap(),
            "{\n  \"name\": \"a\",\n  \"version\": \"1.0.0\"\n}"
        );
    }

    #[test]
    fn test_set_name_adds_missing_field() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("package.json");
        std::fs::write(&file, "{\n  \"private\": true\n}\n").unwrap();

        let mut pkg = PackageJson::read(&file).unwrap();
        assert_eq!(pkg.name(), None);
        pkg.set_name("demo").unwrap();
        assert_eq!(pkg.name(), Some("demo"));
    }

    #[test]
    fn test_set_name_on_non_object_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("package.json");
        std::fs::write(&file, "[1, 2]").unwrap();

        let mut pkg = PackageJson::read(&file).unwrap();
        assert!(pkg.set_name("demo").is_err());
    }

    #[test]
    fn test_crlf_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("package.json");
        let crlf = TWO_SPACE.replace('\n', "\r\n");
        std::fs::write(&file, &crlf).unwrap();

        let pkg = update_package_json(&file, |json| {
            json["description"] = json!("line one\nline two");
        })
        .unwrap();
        assert_eq!(pkg.line_ending(), "\r\n");

        let written = std::fs::read_to_string(&file).unwrap();
        // The escaped newline in the value stays escaped
        assert_eq!(
            written,
            "{\r\n  \"name\": \"template\",\r\n  \"version\": \"1.0.0\",\r\n  \"scripts\": {\r\n    \"dev\": \"node index.js\"\r\n  },\r\n  \"description\": \"line one\\nline two\"\r\n}\r\n"
        );
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("package.json");
        std::fs::write(&file, "{ \"name\": ").unwrap();

        let err = PackageJson::read(&file).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
