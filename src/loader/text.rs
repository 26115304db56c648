//! Line-oriented text module loader.

use crate::error::{InterpreterError, Result};
use crate::module::{DataDirective, Function, Instruction, Program};
use crate::operand::{parse_operand, split_top_level_commas};

/// Parse a BASM text module source into a [`Module`].
pub fn load_text(source: &str) -> Result<Program> {
    let mut module = Program::new();
    let lines: Vec<&str> = source.lines().collect();
    let mut i = 0usize;
    while i < lines.len() {
        let line_no = i + 1;
        let line = lines[i].trim();
        i += 1;
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("module") {
            let _ = rest;
            continue;
        }
        if let Some(rest) = line.strip_prefix("memory") {
            let _ = rest;
            continue;
        }
        if let Some(rest) = line.strip_prefix("data") {
            let (name, opened_inline) = parse_block_header(rest, '$', line_no)?;
            let directives = parse_data_block(&lines, &mut i, opened_inline, line_no)?;
            module.data_builders.insert(name, directives);
            continue;
        }
        if let Some(rest) = line.strip_prefix("func") {
            let (name, params, opened_inline) = parse_func_header(rest, line_no)?;
            let mut func = Function::new(name.clone(), params);
            parse_func_block(&lines, &mut i, opened_inline, line_no, &mut func)?;
            module.functions.insert(name, func);
            continue;
        }
        if let Some(rest) = line.strip_prefix("export") {
            let (internal, alias) = parse_export(rest, line_no)?;
            module.exports.insert(alias, internal);
            continue;
        }
        return Err(InterpreterError::module_load(
            line_no,
            format!("unrecognized top-level construct: {line}"),
        ));
    }
    Ok(module)
}

/// Parse the `$name {` header shared by `data` blocks, returning the name and
/// whether the opening brace appeared on this line.
fn parse_block_header(rest: &str, sigil: char, line_no: usize) -> Result<(String, bool)> {
    let rest = rest.trim();
    let rest = rest
        .strip_prefix(sigil)
        .ok_or_else(|| InterpreterError::module_load(line_no, "expected name after sigil"))?;
    let opened_inline = rest.trim_end().ends_with('{');
    let name_part = rest.trim_end().trim_end_matches('{').trim();
    if name_part.is_empty() {
        return Err(InterpreterError::module_load(line_no, "missing block name"));
    }
    Ok((name_part.to_string(), opened_inline))
}

fn parse_data_block(
    lines: &[&str],
    i: &mut usize,
    mut opened: bool,
    header_line: usize,
) -> Result<Vec<DataDirective>> {
    let mut directives = Vec::new();
    loop {
        if !opened {
            // allow `{` on its own line
            if *i >= lines.len() {
                return Err(InterpreterError::module_load(
                    header_line,
                    "unterminated data block",
                ));
            }
            let line = lines[*i].trim();
            *i += 1;
            if line == "{" {
                opened = true;
            }
            continue;
        }
        if *i >= lines.len() {
            return Err(InterpreterError::module_load(
                header_line,
                "unterminated data block",
            ));
        }
        let line_no = *i + 1;
        let raw = lines[*i];
        *i += 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line == "}" {
            break;
        }
        directives.push(parse_directive(line, line_no)?);
    }
    Ok(directives)
}

fn parse_directive(line: &str, line_no: usize) -> Result<DataDirective> {
    let (op, arg) = split_first_token(line);
    match op {
        "write.len" => {
            let n = arg
                .trim()
                .parse::<i64>()
                .map_err(|_| InterpreterError::module_load(line_no, "invalid write.len argument"))?;
            Ok(DataDirective::WriteLen(n))
        }
        "write.i64" => {
            let n = arg
                .trim()
                .parse::<i64>()
                .map_err(|_| InterpreterError::module_load(line_no, "invalid write.i64 argument"))?;
            Ok(DataDirective::WriteI64(n))
        }
        "write.bytes" => {
            let bytes = parse_escaped_string(arg.trim(), line_no)?;
            Ok(DataDirective::WriteBytes(bytes))
        }
        other => Err(InterpreterError::module_load(
            line_no,
            format!("unrecognized data directive: {other}"),
        )),
    }
}

fn parse_escaped_string(text: &str, line_no: usize) -> Result<Vec<u8>> {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| InterpreterError::module_load(line_no, "expected quoted string"))?;
    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push(b'\n'),
                Some('t') => out.push(b'\t'),
                Some('\\') => out.push(b'\\'),
                Some('x') => {
                    let hi = chars.next().and_then(|c| c.to_digit(16));
                    let lo = chars.next().and_then(|c| c.to_digit(16));
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => out.push(((hi << 4) | lo) as u8),
                        _ => {
                            return Err(InterpreterError::module_load(
                                line_no,
                                "invalid \\x escape",
                            ))
                        }
                    }
                }
                Some(other) => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
                }
                None => {}
            }
        } else {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    Ok(out)
}

fn parse_func_header(rest: &str, line_no: usize) -> Result<(String, Vec<String>, bool)> {
    let rest = rest.trim();
    let rest = rest
        .strip_prefix('$')
        .ok_or_else(|| InterpreterError::module_load(line_no, "expected $name after func"))?;
    let open_paren = rest
        .find('(')
        .ok_or_else(|| InterpreterError::module_load(line_no, "expected ( in func header"))?;
    let name = rest[..open_paren].trim().to_string();
    let close_paren = rest
        .find(')')
        .ok_or_else(|| InterpreterError::module_load(line_no, "expected ) in func header"))?;
    let params_text = &rest[open_paren + 1..close_paren];
    let params: Vec<String> = params_text
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let after = rest[close_paren + 1..].trim();
    let opened_inline = after.ends_with('{');
    Ok((name, params, opened_inline))
}

fn parse_func_block(
    lines: &[&str],
    i: &mut usize,
    mut opened: bool,
    header_line: usize,
    func: &mut Function,
) -> Result<()> {
    loop {
        if !opened {
            if *i >= lines.len() {
                return Err(InterpreterError::module_load(
                    header_line,
                    "unterminated func block",
                ));
            }
            let line = lines[*i].trim();
            *i += 1;
            if line == "{" {
                opened = true;
            }
            continue;
        }
        if *i >= lines.len() {
            return Err(InterpreterError::module_load(
                header_line,
                "unterminated func block",
            ));
        }
        let line_no = *i + 1;
        let raw = lines[*i];
        *i += 1;
        let mut line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line == "}" {
            break;
        }
        // Strip a trailing `; comment`.
        if let Some(idx) = find_comment_start(line) {
            line = line[..idx].trim();
            if line.is_empty() {
                continue;
            }
        }
        if line.starts_with('.') && line.ends_with(':') {
            let label = line[..line.len() - 1].to_string();
            func.labels.insert(label, func.instructions.len() + 1);
            continue;
        }
        func.instructions.push(parse_instruction(line, line_no)?);
    }
    Ok(())
}

/// Find the index of a `;` that starts a trailing comment, ignoring any `;`
/// that appears inside a quoted string literal.
fn find_comment_start(line: &str) -> Option<usize> {
    let mut in_string = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            ';' if !in_string => return Some(idx),
            _ => {}
        }
    }
    None
}

fn parse_instruction(line: &str, line_no: usize) -> Result<Instruction> {
    let (opcode, rest) = split_first_token(line);
    let operand_texts = split_top_level_commas(rest);
    let mut operands = Vec::with_capacity(operand_texts.len());
    for text in operand_texts {
        operands.push(parse_operand(&text).map_err(|_| {
            InterpreterError::module_load(line_no, format!("invalid operand: {text}"))
        })?);
    }
    Ok(Instruction::new(opcode, operands))
}

fn parse_export(rest: &str, line_no: usize) -> Result<(String, String)> {
    let rest = rest.trim();
    let rest = rest
        .strip_prefix('$')
        .ok_or_else(|| InterpreterError::module_load(line_no, "expected $name after export"))?;
    let (name_text, keyword_and_alias) = split_first_token(rest);
    let name = name_text.to_string();
    let (keyword, alias_text) = split_first_token(keyword_and_alias);
    if keyword != "as" {
        return Err(InterpreterError::module_load(line_no, "expected 'as' in export"));
    }
    let alias_text = alias_text.trim();
    let alias = alias_text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| InterpreterError::module_load(line_no, "expected quoted alias"))?
        .to_string();
    Ok((name, alias))
}

/// Split a line into its first whitespace-separated token and the remainder.
fn split_first_token(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim_start()),
        None => (line, ""),
    }
}
