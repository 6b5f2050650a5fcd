//! The unified CareerGuard facade.
//!
//! [`CareerGuard`] owns one instance of every guard component and runs the
//! request pipeline that every AI-bound form action goes through.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use careerguard_clock::{SharedClock, SystemClock};
use careerguard_limiter::TokenGuard;
use careerguard_safety::SafetyGuard;
use careerguard_store::{LocalCache, TemporaryFileStorage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::{
    config::GuardConfig,
    error::{GenerationError, GuardError},
    sweeper::Sweeper,
    validation::{validate_negotiation_input, validate_scan_input, NegotiationInput, ScanInput},
    verdict::{BlockReason, ReviewFlag, Verdict},
    Result,
};

/// The external text-completion service.
///
/// Implementations wrap whatever AI API the host talks to. The guard never
/// retries; a failure is surfaced as [`GuardError::Generation`].
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = std::result::Result<String, GenerationError>> + Send;
}

/// Rough token count for a prompt: one token per four characters, rounded up.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Result of a TrustApply authenticity scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Company named in the posting.
    pub company: String,
    /// Role named in the posting.
    pub job_title: String,
    /// Generated assessment.
    pub analysis: String,
    /// When the assessment was produced.
    pub generated_at: DateTime<Utc>,
}

/// The guard layer in front of every AI call.
///
/// # Pipeline
///
/// ```text
/// form ──validate──▶ sanitize ──▶ sensitive check ──▶ token/request caps
///                                                          │
///                              review_output ◀── generator ◀┘
/// ```
///
/// Every step can refuse. A refusal before the generator runs commits
/// nothing against the user's allowance.
///
/// # Example
///
/// ```rust,ignore
/// let guard = CareerGuard::new(GuardConfig::default())?;
/// let letter = guard.generate("user-42", &prompt, &client).await?;
/// ```
pub struct CareerGuard {
    config: GuardConfig,
    clock: SharedClock,
    safety: SafetyGuard,
    limiter: Arc<TokenGuard>,
    cache: LocalCache,
    files: Arc<TemporaryFileStorage>,
}

impl CareerGuard {
    /// Build every component from `config` using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache store
    /// cannot be opened.
    pub fn new(config: GuardConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Build every component from `config` around an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache store
    /// cannot be opened.
    pub fn with_clock(config: GuardConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;

        let safety = SafetyGuard::with_config(config.safety.clone());
        let limiter = Arc::new(TokenGuard::with_clock(config.limiter.clone(), clock.clone()));

        let cache = match &config.cache.path {
            Some(path) => LocalCache::open(path, &config.cache.namespace)?,
            None => LocalCache::temporary(&config.cache.namespace)?,
        }
        .with_clock(clock.clone())
        .with_default_ttl(config.cache.default_ttl()?);

        let files = match &config.files.root {
            Some(root) => TemporaryFileStorage::with_root(root),
            None => TemporaryFileStorage::new(&config.files.namespace),
        }
        .with_clock(clock.clone())
        .with_default_ttl(config.files.default_ttl()?);

        info!(
            "CareerGuard initialized: {} tokens / {} requests per {}s",
            config.limiter.max_tokens_per_window,
            config.limiter.max_requests_per_window,
            config.limiter.window_secs
        );

        Ok(Self {
            config,
            clock,
            safety,
            limiter,
            cache,
            files: Arc::new(files),
        })
    }

    /// Screen a prompt before it is sent to the generator.
    ///
    /// Sanitizes the text, refuses it if nothing is left, checks it for
    /// personal data, then charges the estimated tokens and one request
    /// against `user_id`. The returned verdict carries the sanitized text.
    pub fn screen_prompt(&self, user_id: &str, text: &str) -> Verdict {
        let text = self.safety.sanitize_input(text);
        if text.is_empty() {
            debug!("Prompt from '{}' empty after sanitization", user_id);
            return Verdict::block(BlockReason::EmptyInput);
        }

        let kinds = self.safety.detect_sensitive(&text);
        if !kinds.is_empty() && self.config.pipeline.block_sensitive_input {
            warn!("Prompt from '{}' blocked: sensitive data", user_id);
            return Verdict::block(BlockReason::SensitiveData { kinds });
        }

        let usage = match self.limiter.try_consume(user_id, estimate_tokens(&text)) {
            Ok(usage) => usage,
            Err(e) => return Verdict::block(e.into()),
        };

        let mut flags = Vec::new();
        if !kinds.is_empty() {
            debug!("Prompt from '{}' carries sensitive data", user_id);
            flags.push(ReviewFlag::SensitiveData { kinds });
        }

        let limit = self.limiter.config().max_tokens_per_window;
        if let Some(pct) = usage.tokens.saturating_mul(100).checked_div(limit) {
            let percentage = pct.min(100) as u8;
            if percentage >= self.config.pipeline.high_usage_percent {
                flags.push(ReviewFlag::HighUsage { percentage });
            }
        }

        if flags.is_empty() {
            Verdict::allow(text)
        } else {
            Verdict::review(text, flags)
        }
    }

    /// Check generated text for leftover template placeholders.
    pub fn review_output(&self, text: &str) -> Verdict {
        match self.safety.find_placeholder(text) {
            Some(marker) => {
                warn!("Generated text contains placeholder '{}'", marker);
                Verdict::block(BlockReason::PlaceholderOutput {
                    marker: marker.to_string(),
                })
            }
            None => Verdict::allow(text),
        }
    }

    /// Run `prompt` through the full pipeline.
    ///
    /// # Errors
    ///
    /// - `GuardError::Blocked` if screening or output review refuses
    /// - `GuardError::Generation` if the generator fails
    pub async fn generate<G: TextGenerator>(
        &self,
        user_id: &str,
        prompt: &str,
        generator: &G,
    ) -> Result<String> {
        let prompt = match self.screen_prompt(user_id, prompt) {
            Verdict::Block { reason } => return Err(GuardError::Blocked(reason)),
            Verdict::Allow { text } | Verdict::Review { text, .. } => text,
        };

        let output = generator.generate(&prompt).await?;

        match self.review_output(&output) {
            Verdict::Block { reason } => Err(GuardError::Blocked(reason)),
            _ => Ok(output),
        }
    }

    /// Assess whether a job posting looks legitimate.
    ///
    /// Identical postings are answered from the cache for the cache's
    /// default TTL without charging the user again.
    ///
    /// # Errors
    ///
    /// - `GuardError::Validation` if the form is incomplete or malformed
    /// - anything [`generate`](Self::generate) returns
    pub async fn scan_job_posting<G: TextGenerator>(
        &self,
        user_id: &str,
        input: &ScanInput,
        generator: &G,
    ) -> Result<ScanReport> {
        validate_scan_input(input)?;

        let key = scan_cache_key(input);
        if let Some(report) = self.cache.get::<ScanReport>(&key) {
            debug!("Scan cache hit for '{}'", user_id);
            return Ok(report);
        }

        // Report fields hold sanitized form text only
        let company = self.safety.sanitize_input(field(&input.company_name));
        let job_title = self.safety.sanitize_input(field(&input.job_title));

        let mut prompt = format!(
            "Assess whether this job posting is legitimate or a likely scam.\n\
             Title: {}\nCompany: {}\n",
            job_title, company
        );
        if let Some(url) = present(&input.job_url) {
            prompt.push_str(&format!("Posted at: {}\n", url));
        }
        if let Some(email) = present(&input.recruiter_email) {
            prompt.push_str(&format!("Recruiter contact: {}\n", email));
        }
        prompt.push_str(&format!("Description:\n{}", field(&input.job_description)));

        let analysis = self.generate(user_id, &prompt, generator).await?;
        let report = ScanReport {
            company,
            job_title,
            analysis,
            generated_at: self.clock.now(),
        };

        if !self.cache.set_default(&key, &report) {
            warn!("Scan result for '{}' not cached", report.company);
        }
        Ok(report)
    }

    /// Draft a salary negotiation email.
    ///
    /// # Errors
    ///
    /// - `GuardError::Validation` if the form is incomplete or malformed
    /// - anything [`generate`](Self::generate) returns
    pub async fn draft_negotiation_email<G: TextGenerator>(
        &self,
        user_id: &str,
        input: &NegotiationInput,
        generator: &G,
    ) -> Result<String> {
        validate_negotiation_input(input)?;

        let currency = present(&input.currency).unwrap_or("USD");
        let mut prompt = format!(
            "Write a polite salary negotiation email for the {} role at {}.\n\
             Current offer: {:.0} {}\nTarget salary: {:.0} {}\n",
            field(&input.job_title),
            field(&input.company_name),
            input.current_offer.unwrap_or_default(),
            currency,
            input.target_salary.unwrap_or_default(),
            currency
        );
        if let Some(justification) = present(&input.justification) {
            prompt.push_str(&format!("Justification:\n{}", justification));
        }

        self.generate(user_id, &prompt, generator).await
    }

    /// Start the periodic limiter and temp file sweep.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(&self) -> Sweeper {
        Sweeper::spawn(
            Arc::clone(&self.limiter),
            Arc::clone(&self.files),
            StdDuration::from_secs(self.config.sweep.interval_secs),
        )
    }

    /// Get the configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Get the Safety Guard.
    pub fn safety(&self) -> &SafetyGuard {
        &self.safety
    }

    /// Get the Token Guard.
    pub fn limiter(&self) -> &Arc<TokenGuard> {
        &self.limiter
    }

    /// Get the local cache.
    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Get the temporary file storage.
    pub fn files(&self) -> &Arc<TemporaryFileStorage> {
        &self.files
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn scan_cache_key(input: &ScanInput) -> String {
    let mut hasher = Sha256::new();
    for part in [
        &input.job_title,
        &input.company_name,
        &input.job_description,
        &input.job_url,
        &input.recruiter_email,
    ] {
        hasher.update(field(part).as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("scan:{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use careerguard_clock::ManualClock;
    use careerguard_limiter::LimiterConfig;
    use careerguard_safety::SensitiveKind;

    fn guard(config: GuardConfig) -> (CareerGuard, ManualClock) {
        let clock = ManualClock::epoch();
        let guard = CareerGuard::with_clock(config, clock.shared()).unwrap();
        (guard, clock)
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("ééééé"), 2);
    }

    #[test]
    fn test_clean_prompt_allowed() {
        let (guard, _clock) = guard(GuardConfig::default());
        let verdict = guard.screen_prompt("ada", "  Write a cover letter  ");
        assert_eq!(verdict, Verdict::allow("Write a cover letter"));
        assert_eq!(guard.limiter().get_user_usage("ada").requests, 1);
    }

    #[test]
    fn test_script_only_prompt_blocked() {
        let (guard, _clock) = guard(GuardConfig::default());
        let verdict = guard.screen_prompt("ada", "<script>alert(1)</script>");
        assert_eq!(verdict, Verdict::block(BlockReason::EmptyInput));
        assert_eq!(guard.limiter().get_user_usage("ada").requests, 0);
    }

    #[test]
    fn test_sensitive_prompt_flagged() {
        let (guard, _clock) = guard(GuardConfig::default());
        let verdict = guard.screen_prompt("ada", "Reach me at ada@example.com");
        assert_eq!(
            verdict,
            Verdict::review(
                "Reach me at ada@example.com",
                vec![ReviewFlag::SensitiveData {
                    kinds: vec![SensitiveKind::Email]
                }]
            )
        );
    }

    #[test]
    fn test_sensitive_prompt_blocked_when_configured() {
        let mut config = GuardConfig::default();
        config.pipeline.block_sensitive_input = true;
        let (guard, _clock) = guard(config);

        let verdict = guard.screen_prompt("ada", "SSN 123-45-6789");
        assert!(matches!(
            verdict,
            Verdict::Block {
                reason: BlockReason::SensitiveData { .. }
            }
        ));
        assert_eq!(guard.limiter().get_user_usage("ada").requests, 0);
    }

    #[test]
    fn test_high_usage_flag() {
        let mut config = GuardConfig::default();
        config.limiter = LimiterConfig::new().with_max_tokens(10);
        let (guard, _clock) = guard(config);

        // 32 chars, 8 tokens, 80% of the cap
        let verdict = guard.screen_prompt("ada", &"a".repeat(32));
        assert_eq!(
            verdict,
            Verdict::review("a".repeat(32), vec![ReviewFlag::HighUsage { percentage: 80 }])
        );
    }

    #[test]
    fn test_request_cap_blocks() {
        let mut config = GuardConfig::default();
        config.limiter = LimiterConfig::new().with_max_requests(1);
        let (guard, clock) = guard(config);

        assert!(guard.screen_prompt("ada", "hello").is_allowed());
        assert_eq!(
            guard.screen_prompt("ada", "hello"),
            Verdict::block(BlockReason::RequestCapExceeded { used: 1, limit: 1 })
        );

        clock.advance(Duration::hours(1) + Duration::seconds(1));
        assert!(guard.screen_prompt("ada", "hello").is_allowed());
    }

    #[test]
    fn test_review_output() {
        let (guard, _clock) = guard(GuardConfig::default());
        assert!(guard.review_output("Dear hiring manager").is_allowed());
        assert_eq!(
            guard.review_output("Dear [YOUR NAME],"),
            Verdict::block(BlockReason::PlaceholderOutput {
                marker: "[YOUR NAME]".to_string()
            })
        );
    }

    #[test]
    fn test_scan_cache_key_stable_and_distinct() {
        let a = ScanInput {
            job_title: Some("Engineer".into()),
            company_name: Some("Acme".into()),
            ..Default::default()
        };
        let mut b = a.clone();
        assert_eq!(scan_cache_key(&a), scan_cache_key(&b));

        b.company_name = Some("Acme2".into());
        assert_ne!(scan_cache_key(&a), scan_cache_key(&b));
        assert!(scan_cache_key(&a).starts_with("scan:"));
        assert_eq!(scan_cache_key(&a).len(), "scan:".len() + 64);
    }

    #[test]
    fn test_huge_ttl_is_config_error() {
        let mut config = GuardConfig::default();
        config.cache.default_ttl_secs = i64::MAX;
        assert!(matches!(
            CareerGuard::new(config),
            Err(GuardError::Config(_))
        ));

        let mut config = GuardConfig::default();
        config.files.default_ttl_secs = i64::MAX;
        assert!(matches!(
            CareerGuard::new(config),
            Err(GuardError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GuardConfig::default();
        config.sweep.interval_secs = 0;
        assert!(matches!(
            CareerGuard::new(config),
            Err(GuardError::Config(_))
        ));
    }
}
