//! Context-scoped cache names.
//!
//! A local cache is namespaced by the directory context it belongs to, so
//! the same base name used from two projects maps to two distinct backing
//! files.

use std::path::Path;

/// Derives a context-scoped cache name from a base name and a context path.
///
/// The context path is flattened into a single filename component:
/// whitespace runs become underscores and path separators are rewritten so
/// the result never escapes the cache root. Distinct contexts never
/// collide, and the same context always yields the same name.
pub fn local_name(base: &str, context: &Path) -> String {
    let collapsed = collapse_whitespace(&context.to_string_lossy());
    let normalized = if cfg!(windows) {
        normalize_backslash_path(&collapsed)
    } else {
        normalize_slash_path(&collapsed)
    };
    format!("{base}{normalized}")
}

/// Collapses each run of whitespace into a single underscore.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_whitespace = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Rewrites a backslash path: `C:\Users\me` becomes `[C]-Users-me`.
fn normalize_backslash_path(s: &str) -> String {
    let mut chars = s.chars();
    let rewritten = match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            format!("[{drive}]{}", chars.as_str())
        }
        _ => s.to_string(),
    };
    rewritten.replace('\\', "-")
}

/// Rewrites a slash path: `/home/user` becomes `%home%user`.
fn normalize_slash_path(s: &str) -> String {
    s.replace('/', "%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("no_change", "no_change")]
    #[case("one space", "one_space")]
    #[case("tab\tand  run   of spaces", "tab_and_run_of_spaces")]
    fn collapses_whitespace_runs(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(collapse_whitespace(input), expected);
    }

    #[rstest]
    #[case(r"C:\Users\me\wiki", "[C]-Users-me-wiki")]
    #[case(r"d:\notes", "[d]-notes")]
    #[case(r"\\server\share", "--server-share")]
    fn normalizes_backslash_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_backslash_path(input), expected);
    }

    #[rstest]
    #[case("/home/user/wiki", "%home%user%wiki")]
    #[case("relative/path", "relative%path")]
    fn normalizes_slash_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_slash_path(input), expected);
    }

    #[test]
    fn distinct_contexts_never_collide() {
        let a = local_name("links", Path::new("/projects/wiki-a"));
        let b = local_name("links", Path::new("/projects/wiki-b"));
        assert_ne!(a, b);
    }

    #[test]
    fn same_context_is_stable() {
        let a = local_name("links", Path::new("/projects/wiki"));
        let b = local_name("links", Path::new("/projects/wiki"));
        assert_eq!(a, b);
    }

    #[test]
    fn result_is_a_flat_filename_component() {
        let name = local_name("links", Path::new("/home/my notes/wiki"));
        assert!(!name.contains('/'));
        assert!(!name.contains(char::is_whitespace));
    }
}
