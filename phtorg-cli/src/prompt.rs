use std::io::{self, BufRead, Write};

pub const QUESTION: &str = "(r)ename/(p)review/(s)ave/(a)bort? ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Rename,
    Preview,
    Save,
    Abort,
}

impl Response {
    /// Case-insensitive; accepts the first letter or the whole word.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "r" | "rename" => Some(Self::Rename),
            "p" | "preview" => Some(Self::Preview),
            "s" | "save" => Some(Self::Save),
            "a" | "abort" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Asks until a known response is given. End of input counts as abort.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Response> {
    let mut line = String::new();
    loop {
        write!(output, "{QUESTION}")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(Response::Abort);
        }
        if let Some(response) = Response::parse(&line) {
            return Ok(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn parse() {
        assert_eq!(Response::parse("r\n"), Some(Response::Rename));
        assert_eq!(Response::parse("  Preview "), Some(Response::Preview));
        assert_eq!(Response::parse("S"), Some(Response::Save));
        assert_eq!(Response::parse("ABORT"), Some(Response::Abort));
        assert_eq!(Response::parse(""), None);
        assert_eq!(Response::parse("yes"), None);
    }

    #[test]
    fn reprompts_until_known() {
        let mut input = Cursor::new("\nwhat\np\n");
        let mut output = Vec::new();
        assert_eq!(ask(&mut input, &mut output).unwrap(), Response::Preview);
        assert_eq!(String::from_utf8(output).unwrap(), QUESTION.repeat(3));
    }

    #[test]
    fn end_of_input_aborts() {
        let mut input = Cursor::new("nope\n");
        let mut output = Vec::new();
        assert_eq!(ask(&mut input, &mut output).unwrap(), Response::Abort);
    }
}
