use std::io::{BufRead, IsTerminal, Stdin};

/// Parses each line that `FromStr`-parses successfully, silently dropping
/// the rest.
pub fn parse_from_lines<Lines, Out>(lines: Lines) -> Vec<Out>
where
    Lines: Iterator<Item = String>,
    Out: std::str::FromStr,
{
    lines.fold(Vec::new(), |mut acc, line| {
        if let Ok(thing) = line.parse() {
            acc.push(thing);
        }
        acc
    })
}

/// True if stdin is piped (not a terminal), or the optional positional
/// argument was omitted — either way the caller should read the pool of
/// paths from stdin instead.
pub fn should_read_from_stdin<T>(stdin: &Stdin, optional_param: &Option<T>) -> bool {
    !stdin.is_terminal() || optional_param.is_none()
}

/// Reads one file path per line from stdin.
pub fn read_paths_from_stdin(stdin: &Stdin) -> Vec<std::path::PathBuf> {
    parse_from_lines(stdin.lock().lines().filter_map(|l| match l {
        Ok(line) if !line.trim().is_empty() => Some(line),
        Ok(_) => None,
        Err(e) => {
            eprintln!("Error reading from stdin: {e}");
            None
        }
    }))
}
