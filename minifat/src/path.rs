//! 用户路径的切分。`\`与`/`等价，`X:`前缀指定盘符。

/// 显示路径时使用的分隔符
pub const SEPARATOR: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath<'a> {
    /// `X:`前缀中的盘符
    pub drive: Option<char>,
    /// 是否从根目录出发
    pub absolute: bool,
    /// 去掉空段后的各级名称，可能包含`.`与`..`
    pub components: Vec<&'a str>,
}

pub fn parse(path: &str) -> ParsedPath<'_> {
    let path = path.trim();
    let (drive, rest) = split_drive(path);
    let absolute = drive.is_some() || rest.starts_with(['\\', '/']);
    let components = rest
        .split(['\\', '/'])
        .map(str::trim)
        .filter(|cmp| !cmp.is_empty())
        .collect();

    ParsedPath {
        drive,
        absolute,
        components,
    }
}

/// 把`/`统一替换为[`SEPARATOR`]，并合并连续的分隔符
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.trim().chars() {
        let c = if c == '/' { SEPARATOR } else { c };
        if c == SEPARATOR && out.ends_with(SEPARATOR) {
            continue;
        }
        out.push(c);
    }
    out
}

fn split_drive(path: &str) -> (Option<char>, &str) {
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {
            (Some(letter.to_ascii_uppercase()), &path[2..])
        }
        _ => (None, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative() {
        let parsed = parse("DOCS\\a.txt");
        assert_eq!(None, parsed.drive);
        assert!(!parsed.absolute);
        assert_eq!(vec!["DOCS", "a.txt"], parsed.components);
    }

    #[test]
    fn absolute_with_drive() {
        let parsed = parse("c:\\DOCS/../a.txt");
        assert_eq!(Some('C'), parsed.drive);
        assert!(parsed.absolute);
        assert_eq!(vec!["DOCS", "..", "a.txt"], parsed.components);

        let parsed = parse("D:");
        assert_eq!(Some('D'), parsed.drive);
        assert!(parsed.components.is_empty());
    }

    #[test]
    fn leading_separator_is_absolute() {
        for path in ["\\DOCS", "/DOCS", "  //DOCS//  "] {
            let parsed = parse(path);
            assert!(parsed.absolute, "{path}");
            assert_eq!(vec!["DOCS"], parsed.components, "{path}");
        }
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert!(parse("").components.is_empty());
        assert_eq!(vec!["a", "."], parse("a\\\\ \\.").components);
    }

    #[test]
    fn normalize_separators() {
        assert_eq!("C:\\DOCS\\a.txt", normalize("C:/DOCS//a.txt"));
        assert_eq!("\\", normalize("/"));
    }
}
