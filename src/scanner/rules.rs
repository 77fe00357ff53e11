//! Compiled-in removal policy.
//!
//! Every table holds lowercase names; lookups lowercase the basename first.

/// Extra paths to remove when a specific package is encountered.
///
/// Paths are relative to the directory containing the package manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageRule {
    /// Exact package name as declared in the manifest.
    pub name: &'static str,
    /// Directories removed recursively.
    pub extra_dirs: &'static [&'static str],
    /// Individual files.
    pub extra_files: &'static [&'static str],
}

/// Immutable policy tables consulted by the classifier and the manifest minifier.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    /// Exact lowercase file names.
    pub file_names: &'static [&'static str],
    /// File extensions, including the leading dot.
    pub extensions: &'static [&'static str],
    /// Literal suffixes matched only against `.js` files.
    pub js_suffixes: &'static [&'static str],
    /// Exact lowercase directory names.
    pub dir_names: &'static [&'static str],
    /// Per-package extra removals.
    pub packages: &'static [PackageRule],
    /// Manifest fields kept by minification, in output order.
    pub manifest_fields: &'static [&'static str],
}

/// Name of the package manifest file.
pub const MANIFEST_FILE_NAME: &str = "package.json";

static BUILTIN: RuleSet = RuleSet {
    file_names: &[
        ".ds_store",
        "license",
        "license.txt",
        "license-mit",
        "license-mit.txt",
        "licence",
        "licence.txt",
        "gulpfile.js",
        "gruntfile.js",
        "author",
        "authors",
        "changelog",
        "changes",
        "history",
        "contributors",
        ".npmignore",
        ".gitignore",
        ".gitattributes",
        ".editorconfig",
        ".coveralls.yml",
        ".prettierrc",
        ".prettierrc.js",
        ".travis.yml",
        "appveyor.yml",
        "karma.conf.js",
        "makefile",
        "tsconfig.json",
        "tslint.json",
        "tslint.yaml",
        ".eslintrc",
        ".eslintrc.js",
        ".eslintrc.json",
        ".eslintrc.yaml",
        ".eslintrc.yml",
        ".jshintrc",
        ".babelrc",
        "yarn.lock",
        "package-lock.json",
    ],
    extensions: &[".md", ".markdown", ".map"],
    js_suffixes: &[".min.js", ".test.js", ".spec.js", ".debug.js"],
    dir_names: &[
        "example",
        "examples",
        "test",
        "tests",
        "__tests__",
        "spec",
        "coverage",
        "benchmark",
        "benchmarks",
        "doc",
        "docs",
        ".idea",
        ".vscode",
        ".github",
    ],
    packages: &[
        PackageRule {
            name: "rxjs",
            extra_dirs: &["_esm5", "_esm2015", "bundles", "src"],
            extra_files: &[],
        },
        PackageRule {
            name: "moment",
            extra_dirs: &["min", "src"],
            extra_files: &["ender.js", "package.js"],
        },
        PackageRule {
            name: "ajv",
            extra_dirs: &["dist"],
            extra_files: &["scripts/info"],
        },
        PackageRule {
            name: "source-map",
            extra_dirs: &["dist"],
            extra_files: &[],
        },
        PackageRule {
            name: "typescript",
            extra_dirs: &["loc"],
            extra_files: &[],
        },
    ],
    // Whitelist projection is intentionally lossy: anything not listed here,
    // including custom fields, is dropped.
    manifest_fields: &[
        "name",
        "version",
        "type",
        "main",
        "module",
        "browser",
        "exports",
        "imports",
        "types",
        "typings",
        "bin",
        "scripts",
        "gypfile",
        "dependencies",
        "peerDependencies",
        "optionalDependencies",
        "bundledDependencies",
        "bundleDependencies",
        "engines",
        "os",
        "cpu",
    ],
};

impl RuleSet {
    /// The built-in policy.
    pub fn builtin() -> &'static RuleSet {
        &BUILTIN
    }

    pub fn is_blacklisted_name(&self, lower_name: &str) -> bool {
        self.file_names.contains(&lower_name)
    }

    pub fn is_blacklisted_extension(&self, lower_ext: &str) -> bool {
        self.extensions.contains(&lower_ext)
    }

    /// True if a lowercase `.js` file name ends with one of the compound suffixes.
    pub fn matches_js_suffix(&self, lower_name: &str) -> bool {
        self.js_suffixes.iter().any(|s| lower_name.ends_with(s))
    }

    pub fn is_blacklisted_dir(&self, lower_name: &str) -> bool {
        self.dir_names.contains(&lower_name)
    }

    /// Look up the per-package rule for an exact package name.
    pub fn package_rule(&self, name: &str) -> Option<&PackageRule> {
        self.packages.iter().find(|rule| rule.name == name)
    }

    pub fn is_manifest_field(&self, field: &str) -> bool {
        self.manifest_fields.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_lowercase() {
        let rules = RuleSet::builtin();
        for name in rules
            .file_names
            .iter()
            .chain(rules.extensions)
            .chain(rules.js_suffixes)
            .chain(rules.dir_names)
        {
            assert_eq!(*name, name.to_lowercase(), "{} is not lowercase", name);
        }
    }

    #[test]
    fn js_suffixes_all_end_in_js() {
        assert!(RuleSet::builtin()
            .js_suffixes
            .iter()
            .all(|s| s.ends_with(".js")));
    }

    #[test]
    fn package_rule_lookup_is_exact() {
        let rules = RuleSet::builtin();
        assert!(rules.package_rule("moment").is_some());
        assert!(rules.package_rule("Moment").is_none());
        assert!(rules.package_rule("moment-timezone").is_none());
    }

    #[test]
    fn manifest_whitelist_keeps_runtime_fields_only() {
        let rules = RuleSet::builtin();
        for field in ["name", "version", "main", "scripts", "typings", "bin", "dependencies"] {
            assert!(rules.is_manifest_field(field), "{} should be kept", field);
        }
        for field in ["description", "homepage", "repository", "readme", "_resolved"] {
            assert!(!rules.is_manifest_field(field), "{} should be dropped", field);
        }
    }

    #[test]
    fn extension_lookup_expects_leading_dot() {
        let rules = RuleSet::builtin();
        assert!(rules.is_blacklisted_extension(".md"));
        assert!(!rules.is_blacklisted_extension("md"));
        assert!(!rules.is_blacklisted_extension(".js"));
    }
}
