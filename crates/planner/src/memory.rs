//! In-memory connection
//!
//! [`MemoryConnection`] records every statement it receives and keeps a
//! catalog of tables, their columns and their keys. `CREATE TABLE`,
//! `DROP TABLE` and the `ALTER TABLE` clauses the planner emits are
//! checked against that catalog the way MySQL would check them, so a plan
//! that drops a missing column or indexes a column before adding it fails
//! here too. It backs dry runs and the tests of everything that needs a
//! [`Connection`].

use indexmap::IndexMap;
use schemata_core::{Connection, EngineError, EngineResult, ExecResult, MySqlDialect, Quoter};
use tracing::debug;

/// Name MySQL gives every primary key
const PRIMARY_KEY_NAME: &str = "PRIMARY";

// ============================================================================
// Catalog
// ============================================================================

/// One table as the in-memory catalog sees it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogTable {
    /// Column name to its full definition, e.g. `` `id` INT AUTO_INCREMENT ``
    columns: IndexMap<String, String>,
    /// Key name to its columns; the primary key is named `PRIMARY`
    keys: IndexMap<String, Vec<String>>,
}

impl CatalogTable {
    /// Column names, in table order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Definition of a column as it was last created or changed
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }

    /// Key names, in creation order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Columns covered by a key
    pub fn key_columns(&self, name: &str) -> Option<&[String]> {
        self.keys.get(name).map(Vec::as_slice)
    }

    fn add_column(&mut self, name: String, definition: String) -> Result<(), String> {
        if self.columns.contains_key(&name) {
            return Err(format!("Duplicate column name '{name}'"));
        }
        self.columns.insert(name, definition);
        Ok(())
    }

    fn drop_column(&mut self, name: &str) -> Result<(), String> {
        if self.columns.shift_remove(name).is_none() {
            return Err(format!("Can't DROP '{name}'; check that column/key exists"));
        }
        // MySQL narrows indexes over the column and drops the ones left empty
        for columns in self.keys.values_mut() {
            columns.retain(|c| c != name);
        }
        self.keys.retain(|_, columns| !columns.is_empty());
        Ok(())
    }

    fn change_column(&mut self, old: &str, name: String, definition: String) -> Result<(), String> {
        let Some(index) = self.columns.get_index_of(old) else {
            return Err(format!("Unknown column '{old}'"));
        };
        if name != old && self.columns.contains_key(&name) {
            return Err(format!("Duplicate column name '{name}'"));
        }
        self.columns.shift_remove(old);
        self.columns.shift_insert(index, name.clone(), definition);
        for columns in self.keys.values_mut() {
            for column in columns.iter_mut().filter(|c| c.as_str() == old) {
                *column = name.clone();
            }
        }
        Ok(())
    }

    fn add_key(&mut self, name: String, columns: Vec<String>) -> Result<(), String> {
        if self.keys.contains_key(&name) {
            return Err(if name == PRIMARY_KEY_NAME {
                "Multiple primary key defined".to_string()
            } else {
                format!("Duplicate key name '{name}'")
            });
        }
        if let Some(missing) = columns.iter().find(|c| !self.columns.contains_key(*c)) {
            return Err(format!("Key column '{missing}' doesn't exist in table"));
        }
        self.keys.insert(name, columns);
        Ok(())
    }

    fn drop_key(&mut self, name: &str) -> Result<(), String> {
        if self.keys.shift_remove(name).is_none() {
            return Err(format!("Can't DROP '{name}'; check that column/key exists"));
        }
        Ok(())
    }

    /// Build a table from the body of a `CREATE TABLE` statement
    fn from_definitions(definitions: &[&str]) -> Result<Self, String> {
        let mut table = Self::default();
        let mut keys = Vec::new();
        for definition in definitions {
            match parse_identifier(definition) {
                Some((name, _)) => table.add_column(name, definition.to_string())?,
                None => keys.push(
                    parse_key(definition)
                        .ok_or_else(|| format!("Unreadable definition '{definition}'"))?,
                ),
            }
        }
        // keys may be listed before the columns they cover
        for (name, columns) in keys {
            table.add_key(name, columns)?;
        }
        Ok(table)
    }
}

// ============================================================================
// MemoryConnection
// ============================================================================

/// A connection that never leaves the process
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    tables: IndexMap<String, CatalogTable>,
    statements: Vec<String>,
    fail_on: Vec<String>,
}

impl MemoryConnection {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing table that has no columns
    pub fn with_table(mut self, name: impl Into<String>) -> Self {
        self.tables.insert(name.into(), CatalogTable::default());
        self
    }

    /// Fail every statement containing `pattern`
    pub fn fail_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_on.push(pattern.into());
        self
    }

    /// Statements executed successfully, in order
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Tables currently in the catalog
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Check the catalog without issuing a query
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Columns and keys of one table
    pub fn table(&self, name: &str) -> Option<&CatalogTable> {
        self.tables.get(name)
    }

    fn track(&mut self, sql: &str) -> EngineResult<()> {
        let sql_start = sql.trim_start();
        let fail = |message: String| EngineError::execution(sql, message);
        let unreadable = || fail("Unable to read table name".to_string());

        if let Some(rest) = strip_keyword(sql_start, "CREATE TABLE") {
            let (if_not_exists, rest) = match strip_keyword(rest, "IF NOT EXISTS") {
                Some(rest) => (true, rest),
                None => (false, rest),
            };
            let (name, rest) = parse_identifier(rest).ok_or_else(unreadable)?;
            if self.tables.contains_key(&name) {
                if if_not_exists {
                    return Ok(());
                }
                return Err(fail(format!("Table '{name}' already exists")));
            }
            let definitions = split_definitions(rest)
                .ok_or_else(|| fail(format!("Unable to read the columns of '{name}'")))?;
            let table = CatalogTable::from_definitions(&definitions).map_err(fail)?;
            self.tables.insert(name, table);
        } else if let Some(rest) = strip_keyword(sql_start, "DROP TABLE") {
            let (name, _) = parse_identifier(rest).ok_or_else(unreadable)?;
            if self.tables.shift_remove(&name).is_none() {
                return Err(fail(format!("Unknown table '{name}'")));
            }
        } else if let Some(rest) = strip_keyword(sql_start, "ALTER TABLE") {
            let (name, clause) = parse_identifier(rest).ok_or_else(unreadable)?;
            let Some(table) = self.tables.get_mut(&name) else {
                return Err(fail(format!("Table '{name}' doesn't exist")));
            };
            alter(table, clause.trim()).map_err(fail)?;
        }

        Ok(())
    }
}

/// Apply one `ALTER TABLE` clause; clauses the planner never emits are ignored
fn alter(table: &mut CatalogTable, clause: &str) -> Result<(), String> {
    let unreadable = || format!("Unable to read clause '{clause}'");

    if let Some(rest) = strip_keyword(clause, "ADD COLUMN") {
        let (name, _) = parse_identifier(rest).ok_or_else(unreadable)?;
        table.add_column(name, rest.trim().to_string())
    } else if let Some(rest) = strip_keyword(clause, "DROP COLUMN") {
        let (name, _) = parse_identifier(rest).ok_or_else(unreadable)?;
        table.drop_column(&name)
    } else if let Some(rest) = strip_keyword(clause, "CHANGE COLUMN") {
        let (old, definition) = parse_identifier(rest).ok_or_else(unreadable)?;
        let definition = definition.trim();
        let (name, _) = parse_identifier(definition).ok_or_else(unreadable)?;
        table.change_column(&old, name, definition.to_string())
    } else if strip_keyword(clause, "DROP PRIMARY KEY").is_some() {
        table.drop_key(PRIMARY_KEY_NAME)
    } else if let Some(rest) = strip_keyword(clause, "DROP FOREIGN KEY")
        .or_else(|| strip_keyword(clause, "DROP KEY"))
        .or_else(|| strip_keyword(clause, "DROP INDEX"))
    {
        let (name, _) = parse_identifier(rest).ok_or_else(unreadable)?;
        table.drop_key(&name)
    } else if let Some(rest) = strip_keyword(clause, "ADD") {
        let (name, columns) = parse_key(rest).ok_or_else(unreadable)?;
        table.add_key(name, columns)
    } else {
        Ok(())
    }
}

impl Quoter for MemoryConnection {
    fn quote_identifier(&self, ident: &str) -> String {
        MySqlDialect.quote_identifier(ident)
    }

    fn quote(&self, value: &str) -> String {
        MySqlDialect.quote(value)
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, sql: &str) -> EngineResult<ExecResult> {
        if let Some(pattern) = self.fail_on.iter().find(|p| sql.contains(p.as_str())) {
            return Err(EngineError::execution(
                sql,
                format!("Simulated failure on '{pattern}'"),
            ));
        }
        self.track(sql)?;
        debug!(statement = %sql, "Recorded statement");
        self.statements.push(sql.to_string());
        Ok(ExecResult::new(0))
    }

    fn query_column(&mut self, sql: &str) -> EngineResult<Vec<String>> {
        let Some(rest) = strip_keyword(sql.trim(), "SHOW TABLES") else {
            return Ok(Vec::new());
        };
        let pattern = strip_keyword(rest, "LIKE").and_then(parse_literal);

        Ok(self
            .tables
            .keys()
            .filter(|t| pattern.as_deref().is_none_or(|p| like_match(p, t)))
            .cloned()
            .collect())
    }
}

/// Strip a case-insensitive keyword and the whitespace after it
fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let head = s.get(..keyword.len())?;
    if head.eq_ignore_ascii_case(keyword) {
        s.get(keyword.len()..).map(str::trim_start)
    } else {
        None
    }
}

/// Read a backtick-quoted identifier at the start of `s`, returning it and
/// the text after it
fn parse_identifier(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('`')?;
    let mut out = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '`' {
            out.push(c);
        } else if chars.peek().is_some_and(|&(_, next)| next == '`') {
            chars.next();
            out.push('`');
        } else {
            return Some((out, &body[i + 1..]));
        }
    }
    None
}

/// Read a parenthesized, comma separated list of identifiers
fn parse_identifier_list(s: &str) -> Option<(Vec<String>, &str)> {
    let mut rest = s.trim_start().strip_prefix('(')?;
    let mut names = Vec::new();
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix(')') {
            return Some((names, after));
        }
        if !names.is_empty() {
            rest = rest.strip_prefix(',')?.trim_start();
        }
        let (name, after) = parse_identifier(rest)?;
        names.push(name);
        rest = after;
    }
}

/// Read a key definition as rendered in `CREATE TABLE` or after `ADD`
fn parse_key(s: &str) -> Option<(String, Vec<String>)> {
    let s = s.trim();
    if let Some(rest) = strip_keyword(s, "PRIMARY KEY") {
        let (columns, _) = parse_identifier_list(rest)?;
        return Some((PRIMARY_KEY_NAME.to_string(), columns));
    }
    if let Some(rest) = strip_keyword(s, "CONSTRAINT") {
        let (name, rest) = parse_identifier(rest)?;
        let rest = strip_keyword(rest.trim_start(), "FOREIGN KEY")?;
        let (columns, _) = parse_identifier_list(rest)?;
        return Some((name, columns));
    }
    let rest = strip_keyword(s, "UNIQUE").unwrap_or(s);
    let rest = strip_keyword(rest, "KEY").or_else(|| strip_keyword(rest, "INDEX"))?;
    let (name, rest) = parse_identifier(rest)?;
    let (columns, _) = parse_identifier_list(rest)?;
    Some((name, columns))
}

/// Split the parenthesized body of `CREATE TABLE` at its top-level commas
fn split_definitions(s: &str) -> Option<Vec<&str>> {
    let body = s.trim_start().strip_prefix('(')?;
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q == '\'' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '`' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' if depth == 0 => {
                parts.push(body[start..i].trim());
                return Some(parts.into_iter().filter(|p| !p.is_empty()).collect());
            }
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    None
}

/// Read a single-quoted, backslash-escaped literal
fn parse_literal(s: &str) -> Option<String> {
    let mut chars = s.strip_prefix('\'')?.chars();
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'Z' => out.push('\x1a'),
                other => out.push(other),
            },
            '\'' => return Some(out),
            c => out.push(c),
        }
    }
    None
}

/// `LIKE` matching with `%` and `_`
fn like_match(pattern: &str, value: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();

    // dp[j]: pattern[..i] matches value[..j]
    let mut dp = vec![false; v.len() + 1];
    dp[0] = true;
    for &pc in &p {
        let mut next = vec![false; v.len() + 1];
        if pc == '%' {
            let mut any = false;
            for j in 0..=v.len() {
                any |= dp[j];
                next[j] = any;
            }
        } else {
            for j in 1..=v.len() {
                next[j] = dp[j - 1] && (pc == '_' || pc == v[j - 1]);
            }
        }
        dp = next;
    }
    dp[v.len()]
}

// ============================================================================
// Tests
// ============================================================================
