use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Directories holding this crate's own Rust sources.
const SOURCE_DIRS: [&str; 4] = ["screen", "cli", "tests", "benches"];

const FORBIDDEN_WORDS: [&str; 14] = [
    "FIXED",
    "CORRECTED",
    "FIX",
    "FIXES",
    "NEW",
    "CHANGED",
    "CHANGES",
    "CHANGE",
    "MODIFIED",
    "MODIFIES",
    "MODIFY",
    "UPDATED",
    "UPDATES",
    "UPDATE",
];

// Collects the offending lines of one file, then renders them as a build error.
struct LineCollector {
    violations: Vec<String>,
    file_path: PathBuf,
    kind: Check,
}

#[derive(Clone, Copy)]
enum Check {
    UnderscorePrefix,
    ForbiddenWord,
    StarsOutsideDocComment,
    AllCapsComment,
    AllowDeadCode,
}

impl Check {
    fn pattern(self) -> &'static str {
        match self {
            Check::UnderscorePrefix => r"\b(_[a-zA-Z0-9_]+)\b",
            Check::ForbiddenWord => {
                r"(//|/\*|///).*(?:FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE)"
            }
            Check::StarsOutsideDocComment => r"(//|/\*).*\*\*",
            Check::AllCapsComment => r"(//|/\*|///).*",
            Check::AllowDeadCode => r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Check::UnderscorePrefix => "underscore-prefixed identifiers",
            Check::ForbiddenWord => "forbidden comment words",
            Check::StarsOutsideDocComment => "'**' patterns in regular comments",
            Check::AllCapsComment => "comments with all uppercase alphabetic characters",
            Check::AllowDeadCode => "#[allow(dead_code)] attributes",
        }
    }

    fn advice(self) -> String {
        match self {
            Check::UnderscorePrefix => {
                "Either use the binding (removing the underscore) or remove it completely."
                    .to_string()
            }
            Check::ForbiddenWord => format!(
                "Comments containing any of {} are not allowed. Remove them completely.",
                FORBIDDEN_WORDS.join(", ")
            ),
            Check::StarsOutsideDocComment => {
                "The '**' pattern is only allowed in doc comments.".to_string()
            }
            Check::AllCapsComment => "Rewrite the comment or delete it.".to_string(),
            Check::AllowDeadCode => {
                "Either use the code (removing the attribute) or remove it completely.".to_string()
            }
        }
    }

    // The build script itself may name the forbidden patterns.
    fn skips_build_script(self) -> bool {
        !matches!(self, Check::UnderscorePrefix)
    }
}

impl LineCollector {
    fn new(file_path: &Path, kind: Check) -> Self {
        Self {
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
            kind,
        }
    }

    fn check_and_get_error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            self.kind.describe(),
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!("\n⚠️ {}\n", self.kind.advice()));
        Some(error_msg)
    }

    fn accepts(&self, line_text: &str) -> bool {
        match self.kind {
            Check::UnderscorePrefix => {
                !is_comment_line(line_text) && !underscore_in_string(line_text)
            }
            Check::ForbiddenWord | Check::AllowDeadCode => true,
            Check::StarsOutsideDocComment => !is_doc_comment(line_text),
            Check::AllCapsComment => comment_text(line_text).is_some_and(|text| {
                let alpha: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
                !alpha.is_empty() && alpha.iter().all(|c| c.is_uppercase())
            }),
        }
    }
}

impl Sink for LineCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if self.accepts(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn is_doc_comment(line: &str) -> bool {
    line.trim_start().starts_with("///")
}

fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with("//") || line.contains("/*")
}

// Odd-numbered segments between double quotes are string contents.
fn underscore_in_string(line: &str) -> bool {
    line.contains('"')
        && line
            .split('"')
            .enumerate()
            .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

fn comment_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("///") {
        Some(rest.trim())
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        Some(rest.trim())
    } else if let Some(idx) = line.find("/*") {
        let rest = &line[idx + 2..];
        Some(rest.find("*/").map_or(rest, |end| &rest[..end]).trim())
    } else {
        None
    }
}

fn rust_sources() -> Vec<PathBuf> {
    let mut sources = vec![PathBuf::from("build.rs")];
    for dir in SOURCE_DIRS {
        sources.extend(
            WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
                .map(|e| e.into_path()),
        );
    }
    sources
}

fn run_check(kind: Check, sources: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(kind.pattern())?;
    let mut searcher = Searcher::new();

    for path in sources {
        if kind.skips_build_script() && path.file_name().is_some_and(|name| name == "build.rs") {
            continue;
        }
        if std::fs::metadata(path).is_err() {
            continue;
        }

        let mut collector = LineCollector::new(path, kind);
        searcher.search_path(&matcher, path, &mut collector)?;

        if let Some(error_message) = collector.check_and_get_error_message() {
            return Err(error_message.into());
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SOURCE_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let sources = rust_sources();
    let checks = [
        Check::UnderscorePrefix,
        Check::ForbiddenWord,
        Check::StarsOutsideDocComment,
        Check::AllCapsComment,
        Check::AllowDeadCode,
    ];

    for kind in checks {
        if let Err(e) = run_check(kind, &sources) {
            // Printed to stderr so cargo shows it with the failed build.
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
