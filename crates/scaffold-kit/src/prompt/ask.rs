//! Single-line question/answer over async streams

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Write `question` to `output` and wait for one line from `input`.
///
/// The line terminator is stripped; EOF before any input yields an empty string.
/// Both streams are consumed so they are released once the answer is read,
/// whether or not reading succeeded. There is no timeout; wrap the call in
/// `tokio::time::timeout` if one is needed.
pub async fn ask<R, W>(question: &str, mut input: R, mut output: W) -> std::io::Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(question.as_bytes()).await?;
    output.flush().await?;

    let mut line = String::new();
    input.read_line(&mut line).await?;

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }

    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ask_writes_question_and_reads_line() {
        let input: &[u8] = b"my-app\nignored\n";
        let mut output = Vec::new();

        let answer = ask("project directory: ", input, &mut output).await.unwrap();

        assert_eq!(answer, "my-app");
        assert_eq!(output, b"project directory: ");
    }

    #[tokio::test]
    async fn test_ask_strips_crlf() {
        let input: &[u8] = b"demo\r\n";
        let answer = ask("? ", input, tokio::io::sink()).await.unwrap();
        assert_eq!(answer, "demo");
    }

    #[tokio::test]
    async fn test_ask_keeps_inner_whitespace() {
        let input: &[u8] = b"  spaced name \n";
        let answer = ask("? ", input, tokio::io::sink()).await.unwrap();
        assert_eq!(answer, "  spaced name ");
    }

    #[tokio::test]
    async fn test_ask_eof_is_empty() {
        let input: &[u8] = b"";
        let answer = ask("? ", input, tokio::io::sink()).await.unwrap();
        assert_eq!(answer, "");
    }

    #[tokio::test]
    async fn test_ask_last_line_without_newline() {
        let input: &[u8] = b"last";
        let answer = ask("? ", input, tokio::io::sink()).await.unwrap();
        assert_eq!(answer, "last");
    }
}
