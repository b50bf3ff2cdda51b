//! Canonical plain-text rendering of a case report.
//!
//! Output depends only on the [`ReportInput`]; the same input always renders
//! the same bytes, so a decrypted report can be compared byte-for-byte with
//! a fresh rendering.

use std::fmt::Write as _;

use casefile_core::{
  analysis::{AnalysisResult, DetectorKind},
  case::Case,
  timestamp,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

const RULE: &str = "================================================================";

const LEGAL_NOTICE: &str = "\
This report contains confidential information collected as part of an official
forensic investigation. Unauthorized access, distribution, or use of this
document is strictly prohibited. Evidence integrity is verifiable with the
SHA-256 digest above: recomputing it over the listed snapshots must reproduce
the same value.";

/// Everything that goes into one report rendering.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
  pub report_id:          Uuid,
  pub case:               &'a Case,
  /// Length of the evidence log when the current analysis ran.
  pub analysed_snapshots: usize,
  pub generated_at:       DateTime<Utc>,
}

fn yes_no(b: bool) -> &'static str { if b { "YES" } else { "NO" } }

fn heading(out: &mut String, title: &str) -> std::fmt::Result {
  writeln!(out)?;
  writeln!(out, "== {title} ==")
}

fn field(out: &mut String, label: &str, value: impl std::fmt::Display) -> std::fmt::Result {
  writeln!(out, "{:<18}{value}", format!("{label}:"))
}

fn render_analysis(out: &mut String, analysis: &AnalysisResult) -> std::fmt::Result {
  if let Some(s) = &analysis.sentiment {
    heading(out, "SENTIMENT ANALYSIS")?;
    field(out, "Overall", s.overall.as_str().to_uppercase())?;
    field(out, "Positive", format_args!("{:.2}%", s.positive_percentage))?;
    field(out, "Negative", format_args!("{:.2}%", s.negative_percentage))?;
    field(out, "Neutral", format_args!("{:.2}%", s.neutral_percentage))?;
  }

  if let Some(c) = &analysis.cyberbullying {
    heading(out, "CYBERBULLYING DETECTION")?;
    field(out, "Detected", yes_no(c.detected))?;
    field(out, "Confidence", format_args!("{:.2}%", c.confidence))?;
    field(out, "Incidents", c.incidents_count)?;
    field(out, "Total Flags", c.total_flags)?;
  }

  if let Some(f) = &analysis.fraud_detection {
    heading(out, "FRAUD/SCAM DETECTION")?;
    field(out, "Detected", yes_no(f.detected))?;
    field(out, "Confidence", format_args!("{:.2}%", f.confidence))?;
    field(out, "Suspicious Posts", f.suspicious_count)?;
    field(out, "Total Flags", f.total_flags)?;
  }

  if let Some(p) = &analysis.fake_profile {
    heading(out, "FAKE PROFILE ANALYSIS")?;
    field(out, "Potentially Fake", yes_no(p.is_potentially_fake))?;
    field(out, "Fake Score", format_args!("{:.2}/100", p.fake_score))?;
    field(out, "Account Age", format_args!("{} days", p.account_age_days))?;
    field(out, "Follower Ratio", format_args!("{:.2}", p.follower_ratio))?;
    field(out, "Risk Factors", p.risk_factors.len())?;
    for factor in &p.risk_factors {
      writeln!(out, "  - {factor}")?;
    }
  }

  let present = analysis.detectors();
  let missing: Vec<&str> = [
    DetectorKind::Sentiment,
    DetectorKind::Cyberbullying,
    DetectorKind::Fraud,
    DetectorKind::FakeProfile,
  ]
  .into_iter()
  .filter(|k| !present.contains(k))
  .map(DetectorKind::as_str)
  .collect();
  if !missing.is_empty() {
    heading(out, "NOT ASSESSED")?;
    writeln!(out, "{}", missing.join(", "))?;
  }
  Ok(())
}

/// Render the report document for `input.case`.
///
/// The case must have been analysed and must have at least one snapshot.
pub fn render(input: &ReportInput<'_>) -> Result<Vec<u8>> {
  let case = input.case;
  let analysis = case.analysis_results.as_ref().ok_or(Error::MissingAnalysis)?;
  let evidence_hash = case.evidence_hash.as_ref().ok_or(Error::MissingEvidence)?;

  let mut out = String::new();
  writeln!(out, "{RULE}")?;
  writeln!(out, "FORENSIC INVESTIGATION REPORT")?;
  writeln!(out, "CONFIDENTIAL - OFFICIAL USE ONLY")?;
  writeln!(out, "{RULE}")?;

  heading(&mut out, "CASE INFORMATION")?;
  field(&mut out, "Report ID", input.report_id)?;
  field(&mut out, "Case ID", case.case_id)?;
  field(&mut out, "Investigator", &case.owner)?;
  field(&mut out, "Target Username", &case.target.username)?;
  field(&mut out, "Platform", case.target.platform)?;
  field(&mut out, "Status", case.status.as_str().to_uppercase())?;
  if let Some(description) = &case.description {
    field(&mut out, "Description", description)?;
  }
  field(&mut out, "Created", timestamp::format(case.created_at))?;
  field(&mut out, "Report Generated", timestamp::format(input.generated_at))?;

  heading(&mut out, "RISK ASSESSMENT")?;
  field(&mut out, "Risk Level", case.risk_level.as_str().to_uppercase())?;
  field(&mut out, "Risk Score", format_args!("{:.2}/100", case.risk_score))?;
  let collected = case.data_collected.len();
  field(
    &mut out,
    "Evidence Scored",
    format_args!("{} of {collected} snapshots", input.analysed_snapshots),
  )?;
  if input.analysed_snapshots < collected {
    writeln!(
      out,
      "NOTE: evidence collected after the last analysis is not reflected in this assessment."
    )?;
  }

  render_analysis(&mut out, analysis)?;

  heading(&mut out, "EVIDENCE INVENTORY")?;
  for (sequence, snapshot) in case.data_collected.iter().enumerate() {
    writeln!(
      out,
      "#{sequence:<3} scraped {}  posts {:>4}  followers {:>8}  following {:>8}",
      timestamp::format(snapshot.scraped_at),
      snapshot.posts.len(),
      snapshot.metadata.followers,
      snapshot.metadata.following,
    )?;
  }

  heading(&mut out, "EVIDENCE INTEGRITY")?;
  field(&mut out, "Snapshots", case.data_collected.len())?;
  field(&mut out, "SHA-256", evidence_hash)?;

  heading(&mut out, "LEGAL NOTICE")?;
  writeln!(out, "{LEGAL_NOTICE}")?;

  Ok(out.into_bytes())
}
