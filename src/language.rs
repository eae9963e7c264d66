//! Rendering hints derived from file names. No content-based detection happens here.

use std::fmt;

use crate::contract::extension_of;

/// Language hint handed to the renderer alongside text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageHint(&'static str);

impl LanguageHint {
    pub const TEXT: LanguageHint = LanguageHint("text");
    pub const MARKDOWN: LanguageHint = LanguageHint("markdown");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

const FILENAME_HINTS: &[(&str, &str)] = &[
    ("dockerfile", "docker"),
    ("containerfile", "docker"),
    ("makefile", "make"),
    ("gnumakefile", "make"),
    ("cmakelists.txt", "cmake"),
    ("justfile", "make"),
    ("rakefile", "ruby"),
    ("gemfile", "ruby"),
    ("vagrantfile", "ruby"),
    ("jenkinsfile", "groovy"),
    ("cargo.lock", "toml"),
    (".gitignore", "ini"),
    (".gitattributes", "ini"),
    (".editorconfig", "ini"),
    (".bashrc", "bash"),
    (".zshrc", "bash"),
];

const EXTENSION_HINTS: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("pyi", "python"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "jsx"),
    ("ts", "typescript"),
    ("tsx", "tsx"),
    ("go", "go"),
    ("c", "c"),
    ("h", "c"),
    ("cc", "cpp"),
    ("cpp", "cpp"),
    ("cxx", "cpp"),
    ("hpp", "cpp"),
    ("hh", "cpp"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("kts", "kotlin"),
    ("scala", "scala"),
    ("swift", "swift"),
    ("rb", "ruby"),
    ("php", "php"),
    ("cs", "csharp"),
    ("fs", "fsharp"),
    ("hs", "haskell"),
    ("ml", "ocaml"),
    ("ex", "elixir"),
    ("exs", "elixir"),
    ("erl", "erlang"),
    ("clj", "clojure"),
    ("lua", "lua"),
    ("pl", "perl"),
    ("r", "r"),
    ("jl", "julia"),
    ("zig", "zig"),
    ("nim", "nim"),
    ("dart", "dart"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("fish", "fish"),
    ("ps1", "powershell"),
    ("bat", "batch"),
    ("sql", "sql"),
    ("html", "html"),
    ("htm", "html"),
    ("xml", "xml"),
    ("svg", "xml"),
    ("css", "css"),
    ("scss", "scss"),
    ("sass", "sass"),
    ("less", "less"),
    ("vue", "vue"),
    ("svelte", "svelte"),
    ("json", "json"),
    ("jsonl", "json"),
    ("ndjson", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("ini", "ini"),
    ("cfg", "ini"),
    ("md", "markdown"),
    ("markdown", "markdown"),
    ("mdx", "markdown"),
    ("rst", "rst"),
    ("tex", "latex"),
    ("proto", "protobuf"),
    ("graphql", "graphql"),
    ("gql", "graphql"),
    ("tf", "hcl"),
    ("hcl", "hcl"),
    ("nix", "nix"),
    ("diff", "diff"),
    ("patch", "diff"),
    ("csv", "csv"),
    ("tsv", "csv"),
    ("ipynb", "json"),
];

/// Picks a hint from the exact file name first, then the extension.
pub fn language_hint(repo_relative_path: &str) -> LanguageHint {
    let name = repo_relative_path
        .rsplit('/')
        .next()
        .unwrap_or(repo_relative_path)
        .to_lowercase();

    if let Some((_, hint)) = FILENAME_HINTS.iter().find(|(file, _)| *file == name) {
        return LanguageHint(hint);
    }

    extension_of(repo_relative_path)
        .and_then(|ext| {
            EXTENSION_HINTS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, hint)| LanguageHint(hint))
        })
        .unwrap_or(LanguageHint::TEXT)
}
