use crate::artifacts::ignore::IgnoreFilter;
use anyhow::Context;
use std::path::Path;

/// Glob patterns, one per line; blank lines and `#` comments are skipped
///
/// A pattern is matched against the trailing components of a path: `*.log`
/// matches `debug.log` and `logs/debug.log`, `build/*.o` matches
/// `src/build/main.o`. A leading `/` anchors the pattern at the root. When a
/// pattern matches a directory, everything under it is ignored as well.
///
/// `*` and `?` never match across `/`; `[...]` classes are passed through.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<String>,
    matchers: Vec<regex::Regex>,
}

impl IgnorePatterns {
    pub fn try_parse(content: &str) -> anyhow::Result<Self> {
        let mut ignore = IgnorePatterns::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            ignore.add(line)?;
        }

        Ok(ignore)
    }

    /// Read the patterns of an ignore file; a missing file ignores nothing
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read ignore file {}", path.display()))?;
        Self::try_parse(&content)
    }

    pub fn add(&mut self, pattern: &str) -> anyhow::Result<()> {
        let regex = translate(pattern);
        let matcher = regex::Regex::new(&regex)
            .with_context(|| format!("invalid ignore pattern: {pattern}"))?;

        self.patterns.push(pattern.to_string());
        self.matchers.push(matcher);

        Ok(())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|matcher| matcher.is_match(path))
    }
}

impl IgnoreFilter for IgnorePatterns {
    fn is_ignored(&self, path: &Path) -> bool {
        let Some(path) = path.to_str() else {
            return false;
        };
        let path = path.trim_end_matches('/');

        // the path itself, then every directory above it
        std::iter::once(path)
            .chain(path.match_indices('/').map(|(index, _)| &path[..index]))
            .any(|candidate| self.matches(candidate))
    }
}

fn translate(pattern: &str) -> String {
    let (anchor, pattern) = match pattern.strip_prefix('/') {
        Some(rest) => ("^", rest),
        None => ("(?:^|/)", pattern),
    };
    let pattern = pattern.trim_end_matches('/');

    let mut regex = String::from(anchor);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' && !class.is_empty() {
                        closed = true;
                        break;
                    }
                    class.push(c);
                }

                if closed {
                    let class = class.strip_prefix('!').map_or(class.clone(), |rest| format!("^{rest}"));
                    regex.push('[');
                    regex.push_str(&class.replace('\\', "\\\\"));
                    regex.push(']');
                } else {
                    regex.push_str(&regex::escape(&format!("[{class}")));
                }
            }
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
    }
    regex.push('$');

    regex
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*.log", "debug.log", true)]
    #[case("*.log", "logs/debug.log", true)]
    #[case("*.log", "debug.log.txt", false)]
    #[case("build", "build/out/main.o", true)]
    #[case("build", "src/build", true)]
    #[case("build", "builder.rs", false)]
    #[case("build/*.o", "src/build/main.o", true)]
    #[case("/build", "src/build/main.o", false)]
    #[case("/build", "build/main.o", true)]
    #[case("file?.txt", "file1.txt", true)]
    #[case("file[0-9].txt", "file7.txt", true)]
    #[case("file[!0-9].txt", "file7.txt", false)]
    #[case("*.rs", "a/b.rs/c.txt", true)]
    fn matches_like_path_globs(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
        let ignore = IgnorePatterns::try_parse(pattern).unwrap();

        assert_eq!(ignore.is_ignored(Path::new(path)), expected);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let ignore = IgnorePatterns::try_parse("# editor files\n\n*.swp\n").unwrap();

        assert_eq!(ignore.patterns(), ["*.swp".to_string()]);
    }
}
