use crate::error::VmError;
use crate::machine::MEMORY_SIZE;

/// Parse program text into a byte image.
///
/// One instruction byte per line, written as an 8-digit binary literal
/// (shorter literals are accepted too). Anything after a `#` is a comment.
/// Blank lines and lines that do not parse as binary are skipped, so a
/// program can carry prose freely. The parsed image must fit in memory.
pub fn parse_image(source: &str) -> Result<Vec<u8>, VmError> {
    let mut image = Vec::new();
    for (number, line) in source.lines().enumerate() {
        let code = match line.find('#') {
            Some(at) => &line[..at],
            None => line,
        }
        .trim();
        if code.is_empty() {
            continue;
        }
        match u8::from_str_radix(code, 2) {
            Ok(byte) => image.push(byte),
            Err(_) => {
                tracing::debug!(line = number + 1, text = code, "skipping non-binary line");
            }
        }
    }
    if image.len() > MEMORY_SIZE {
        return Err(VmError::ProgramTooLarge { len: image.len() });
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_binary_literals() {
        let image = parse_image("10000010\n00000000\n00001000\n00000001\n").unwrap();
        assert_eq!(image, vec![130, 0, 8, 1]);
    }

    #[test]
    fn strips_comments_and_whitespace() {
        let source = "
            # load 8 into r0
            10000010  # LDI
            00000000  # r0
            00001000  # 8

            00000001  # HLT
        ";
        assert_eq!(parse_image(source).unwrap(), vec![130, 0, 8, 1]);
    }

    #[test]
    fn comment_only_and_blank_lines_produce_nothing() {
        assert_eq!(parse_image("# just a comment\n\n   \n").unwrap(), vec![]);
    }

    #[test]
    fn non_binary_lines_are_skipped() {
        let source = "hello\n10000010\n2\n00000001\n";
        assert_eq!(parse_image(source).unwrap(), vec![130, 1]);
    }

    #[test]
    fn short_literals_are_accepted() {
        assert_eq!(parse_image("1\n101\n").unwrap(), vec![1, 5]);
    }

    #[test]
    fn rejects_images_over_memory_capacity() {
        let source = "00000000\n".repeat(MEMORY_SIZE + 1);
        assert_eq!(
            parse_image(&source).unwrap_err(),
            VmError::ProgramTooLarge { len: MEMORY_SIZE + 1 }
        );
    }

    #[test]
    fn exactly_full_image_is_accepted() {
        let source = "11111111\n".repeat(MEMORY_SIZE);
        assert_eq!(parse_image(&source).unwrap().len(), MEMORY_SIZE);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Arbitrary text never panics the parser and never yields an
        /// image larger than memory without an error.
        #[test]
        fn arbitrary_text_never_panics(source in ".*") {
            if let Ok(image) = parse_image(&source) {
                prop_assert!(image.len() <= MEMORY_SIZE);
            }
        }

        /// A rendered image round-trips through the text format.
        #[test]
        fn rendered_bytes_round_trip(
            bytes in prop::collection::vec(any::<u8>(), 0..=MEMORY_SIZE)
        ) {
            let source: String = bytes.iter().map(|b| format!("{b:08b}\n")).collect();
            prop_assert_eq!(parse_image(&source).unwrap(), bytes);
        }
    }
}
