use tracing::trace;

/// 一个 DXF 组码/值对。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub code: i32,
    /// 去除首尾空白后的值。
    pub value: &'a str,
    /// 只去掉行尾 `\r` 的原始值，文本内容需要保留边界空格。
    pub raw: &'a str,
}

/// 逐对读取 DXF 文本：组码行在前，值行在后，两行均去除首尾空白；
/// 值行的原始内容另外保存在 [`Tag::raw`] 中。
///
/// 读取器本身从不失败。末尾缺少值行的组码直接视为流结束；组码行无法解析为
/// 整数时跳过这一对并继续。
pub struct TagReader<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
}

impl<'a> TagReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            cursor: 0,
        }
    }

    /// 下一对尚未读取时所在的行号（从 1 开始）。
    #[inline]
    pub fn line_number(&self) -> usize {
        self.cursor + 1
    }

    pub fn next_tag(&mut self) -> Option<Tag<'a>> {
        loop {
            if self.cursor + 1 >= self.lines.len() {
                self.cursor = self.lines.len();
                return None;
            }
            let code_line = self.lines[self.cursor].trim();
            let raw = self.lines[self.cursor + 1].trim_end_matches('\r');
            self.cursor += 2;

            match code_line.parse::<i32>() {
                Ok(code) => {
                    return Some(Tag {
                        code,
                        value: raw.trim(),
                        raw,
                    });
                }
                Err(_) => {
                    trace!(
                        line = self.cursor - 1,
                        code = code_line,
                        "组码无法解析为整数，跳过该组"
                    );
                }
            }
        }
    }
}

impl<'a> Iterator for TagReader<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pairs_and_trims_whitespace() {
        let mut reader = TagReader::new("  0\r\nSECTION  \n  2\nENTITIES\n");
        assert_eq!(
            reader.next_tag(),
            Some(Tag {
                code: 0,
                value: "SECTION",
                raw: "SECTION  "
            })
        );
        assert_eq!(reader.line_number(), 3);
        assert_eq!(
            reader.next_tag(),
            Some(Tag {
                code: 2,
                value: "ENTITIES",
                raw: "ENTITIES"
            })
        );
        assert_eq!(reader.next_tag(), None);
        assert_eq!(reader.next_tag(), None);
    }

    #[test]
    fn dangling_code_line_ends_stream() {
        let tags: Vec<_> = TagReader::new("0\nLINE\n8").collect();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value, "LINE");
    }

    #[test]
    fn non_numeric_code_is_skipped_without_losing_alignment() {
        let tags: Vec<_> = TagReader::new("abc\nvalue\n10\n1.5\n").collect();
        assert_eq!(
            tags,
            vec![Tag {
                code: 10,
                value: "1.5",
                raw: "1.5"
            }]
        );
    }

    #[test]
    fn empty_source_yields_nothing() {
        let mut reader = TagReader::new("");
        assert!(reader.next_tag().is_none());
        assert_eq!(reader.line_number(), 1);
    }

    #[test]
    fn raw_value_keeps_edge_spaces_but_drops_carriage_return() {
        let tags: Vec<_> = TagReader::new("3\n MOTOR \r\n1\nM1\r\r\n").collect();
        assert_eq!(tags[0].value, "MOTOR");
        assert_eq!(tags[0].raw, " MOTOR ");
        assert_eq!(tags[1].raw, "M1");
    }
}
