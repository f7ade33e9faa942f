//! Language catalog and path → language id derivation

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Url;

/// Default identifier shape used by the search providers
pub const DEFAULT_IDENTIFIER_PATTERN: &str = "[A-Za-z_][A-Za-z0-9_]*";

/// Language id assigned to paths nothing else claims
pub const PLAINTEXT: &str = "plaintext";

/// Per-language metadata a registry entry is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSpec {
    pub language_id: String,
    #[serde(default)]
    pub file_exts: Vec<String>,
    #[serde(default)]
    pub verbatim_filenames: Vec<String>,
    /// Whether "find implementations" is offered for this language
    #[serde(default)]
    pub implementations_supported: bool,
    #[serde(default = "default_identifier_pattern")]
    pub identifier_pattern: String,
    /// Keywords that introduce a definition, e.g. `fn` or `class`
    #[serde(default)]
    pub definition_keywords: Vec<String>,
    /// Keywords that introduce an implementation, e.g. `impl` or `implements`
    #[serde(default)]
    pub implementation_keywords: Vec<String>,
}

fn default_identifier_pattern() -> String {
    DEFAULT_IDENTIFIER_PATTERN.to_string()
}

impl LanguageSpec {
    pub fn new(language_id: impl Into<String>) -> Self {
        Self {
            language_id: language_id.into(),
            file_exts: Vec::new(),
            verbatim_filenames: Vec::new(),
            implementations_supported: false,
            identifier_pattern: default_identifier_pattern(),
            definition_keywords: Vec::new(),
            implementation_keywords: Vec::new(),
        }
    }

    pub fn with_exts(mut self, exts: &[&str]) -> Self {
        self.file_exts = to_strings(exts);
        self
    }

    pub fn with_filenames(mut self, filenames: &[&str]) -> Self {
        self.verbatim_filenames = to_strings(filenames);
        self
    }

    pub fn with_definition_keywords(mut self, keywords: &[&str]) -> Self {
        self.definition_keywords = to_strings(keywords);
        self
    }

    /// Enables "find implementations" using the given keywords
    pub fn with_implementations(mut self, keywords: &[&str]) -> Self {
        self.implementations_supported = true;
        self.implementation_keywords = to_strings(keywords);
        self
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// The default catalog, in resolution priority order
pub fn builtin_language_specs() -> Vec<LanguageSpec> {
    vec![
        LanguageSpec::new("typescript")
            .with_exts(&["ts", "tsx", "mts", "cts"])
            .with_definition_keywords(&[
                "function",
                "class",
                "interface",
                "type",
                "enum",
                "namespace",
                "const",
                "let",
                "var",
            ])
            .with_implementations(&["implements", "extends"]),
        LanguageSpec::new("javascript")
            .with_exts(&["js", "jsx", "mjs", "cjs"])
            .with_definition_keywords(&["function", "class", "const", "let", "var"]),
        LanguageSpec::new("rust")
            .with_exts(&["rs"])
            .with_definition_keywords(&[
                "fn",
                "struct",
                "enum",
                "trait",
                "type",
                "union",
                "const",
                "static",
                "mod",
                "let",
                "macro_rules!",
            ])
            .with_implementations(&["impl"]),
        LanguageSpec::new("go")
            .with_exts(&["go"])
            .with_definition_keywords(&["func", "type", "var", "const"]),
        LanguageSpec::new("python")
            .with_exts(&["py", "pyi"])
            .with_definition_keywords(&["def", "class"]),
        LanguageSpec::new("java")
            .with_exts(&["java"])
            .with_definition_keywords(&["class", "interface", "enum", "record"])
            .with_implementations(&["implements", "extends"]),
        LanguageSpec::new("cpp")
            .with_exts(&["c", "cc", "cpp", "cxx", "h", "hh", "hpp"])
            .with_definition_keywords(&["class", "struct", "enum", "union", "typedef", "namespace"]),
        LanguageSpec::new("starlark")
            .with_exts(&["bzl", "star"])
            .with_filenames(&["BUILD", "BUILD.bazel", "WORKSPACE"])
            .with_definition_keywords(&["def"]),
        LanguageSpec::new("shell").with_exts(&["sh", "bash", "zsh"]),
    ]
}

/// Returns true if the catalog marks `language_id` as supporting "find implementations"
pub fn has_find_implementations_support(catalog: &[LanguageSpec], language_id: &str) -> bool {
    catalog
        .iter()
        .find(|spec| spec.language_id == language_id)
        .is_some_and(|spec| spec.implementations_supported)
}

/// Scheme of repository URIs, which keep the file path in the fragment
pub const REPOSITORY_SCHEME: &str = "git";

/// File path carried in the fragment of a repository URI
/// (`git://host/repo?rev#path/to/file`); `None` for any other URL
pub fn repository_path(url: &Url) -> Option<&str> {
    if url.scheme() != REPOSITORY_SCHEME {
        return None;
    }
    url.fragment().filter(|fragment| !fragment.is_empty())
}

/// Extracts the file path from a document URI.
///
/// Repository URIs use their fragment. Other URLs use their path component,
/// so a `#L10` anchor on a file URL is ignored. Strings that do not parse as
/// URLs are taken to be paths already.
pub fn file_path_from_uri(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) => repository_path(&url)
            .map(str::to_string)
            .unwrap_or_else(|| url.path().to_string()),
        Err(_) => uri.to_string(),
    }
}

/// Derives a language id from a file path alone
pub fn language_id_from_path(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);

    if let Some(language_id) = language_for_filename(file_name) {
        return language_id;
    }

    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return PLAINTEXT;
    };

    language_for_extension(&extension.to_ascii_lowercase()).unwrap_or(PLAINTEXT)
}

fn language_for_filename(file_name: &str) -> Option<&'static str> {
    let language_id = match file_name {
        "Dockerfile" => "dockerfile",
        "Makefile" | "GNUmakefile" => "makefile",
        "BUILD" | "BUILD.bazel" | "WORKSPACE" => "starlark",
        "CMakeLists.txt" => "cmake",
        "Gemfile" | "Rakefile" => "ruby",
        _ => return None,
    };
    Some(language_id)
}

fn language_for_extension(extension: &str) -> Option<&'static str> {
    let language_id = match extension {
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "rs" => "rust",
        "go" => "go",
        "py" | "pyi" => "python",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "scala" | "sc" => "scala",
        "c" | "cc" | "cpp" | "cxx" | "h" | "hh" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "bzl" | "star" => "starlark",
        "sh" | "bash" | "zsh" => "shell",
        "md" | "markdown" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "txt" | "text" => "text",
        _ => return None,
    };
    Some(language_id)
}
