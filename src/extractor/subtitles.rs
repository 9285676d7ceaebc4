//! Caption backend driven by the yt-dlp command line
//!
//! Each call makes two attempts, manual subtitles first and then auto-generated
//! ones. Every attempt writes into its own [`SubtitleWorkspace`], which is
//! deleted together with everything yt-dlp wrote as soon as the attempt ends.

use crate::extractor::json3;
use crate::extractor::models::{TranscriptEntry, TranscriptResult, TranscriptSource, VideoId};
use crate::extractor::traits::CaptionBackend;
use crate::extractor::ytdlp::{check_status, YtDlp};
use crate::utils::error::TubescriptError;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// Language tag used when the subtitle file name carries none
const UNDETECTED_LANGUAGE: &str = "detected";

/// Which subtitles one attempt asks yt-dlp for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubtitleKind {
    Manual,
    Auto,
}

impl SubtitleKind {
    fn flag(self) -> &'static str {
        match self {
            SubtitleKind::Manual => "--write-sub",
            SubtitleKind::Auto => "--write-auto-sub",
        }
    }

    fn source(self) -> TranscriptSource {
        match self {
            SubtitleKind::Manual => TranscriptSource::Manual,
            SubtitleKind::Auto => TranscriptSource::AutoGenerated,
        }
    }
}

/// Scratch directory owned by a single attempt; removed on drop
pub struct SubtitleWorkspace {
    dir: TempDir,
    stem: String,
}

impl SubtitleWorkspace {
    pub fn new(video_id: &VideoId) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("tubescript-")
            .tempdir()
            .map_err(TubescriptError::IoError)?;
        Ok(Self {
            dir,
            stem: format!("yt_{}", video_id),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// yt-dlp `-o` template; subtitles land at `<dir>/yt_<id>.<lang>.json3`
    pub fn output_template(&self) -> PathBuf {
        self.dir.path().join(&self.stem)
    }

    /// Subtitle files written so far as `(language, path)`, in no particular order
    pub fn subtitle_files(&self) -> Result<Vec<(Option<String>, PathBuf)>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(self.dir.path()).map_err(TubescriptError::IoError)? {
            let path = entry.map_err(TubescriptError::IoError)?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&self.stem) || !name.ends_with(".json3") {
                continue;
            }
            let lang = name
                .strip_prefix(&self.stem)
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| rest.strip_suffix(".json3"))
                .filter(|lang| !lang.is_empty())
                .map(str::to_string);
            files.push((lang, path));
        }
        Ok(files)
    }

    /// Pick the file whose language comes earliest in `languages`, parse it,
    /// and return the entries with that language tag.
    pub fn read_preferred(&self, languages: &[String]) -> Result<Option<(String, Vec<TranscriptEntry>)>> {
        let mut files = self.subtitle_files()?;
        if files.is_empty() {
            return Ok(None);
        }
        files.sort_by_key(|(lang, path)| (preference_rank(lang.as_deref(), languages), path.clone()));
        let (lang, path) = files.swap_remove(0);

        debug!("Reading subtitles from {}", path.display());
        let json = std::fs::read_to_string(&path).map_err(TubescriptError::IoError)?;
        let entries = json3::parse_events(&json)?;
        Ok(Some((
            lang.unwrap_or_else(|| UNDETECTED_LANGUAGE.to_string()),
            entries,
        )))
    }
}

/// Position of `lang` in the preference list; unlisted languages sort last.
///
/// Region variants count as their base language, so `en-US` ranks as `en`.
fn preference_rank(lang: Option<&str>, languages: &[String]) -> usize {
    let Some(lang) = lang else {
        return languages.len();
    };
    languages
        .iter()
        .position(|l| l == lang)
        .or_else(|| {
            let base = lang.split('-').next().unwrap_or(lang);
            languages.iter().position(|l| l == base)
        })
        .unwrap_or(languages.len())
}

/// Caption backend that shells out to yt-dlp
pub struct YtDlpCaptionBackend {
    ytdlp: YtDlp,
    timeout: Duration,
}

impl YtDlpCaptionBackend {
    pub fn new(ytdlp: YtDlp, timeout: Duration) -> Self {
        Self { ytdlp, timeout }
    }

    async fn attempt_kind(
        &self,
        kind: SubtitleKind,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<TranscriptResult> {
        let workspace = SubtitleWorkspace::new(video_id)?;
        let template = workspace.output_template();
        let url = video_id.watch_url();
        let lang_arg = languages.join(",");

        let args = vec![
            kind.flag().to_string(),
            "--sub-lang".to_string(),
            lang_arg,
            "--sub-format".to_string(),
            "json3".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            url,
        ];

        let output = self.ytdlp.run(args, self.timeout).await?;
        check_status(&output)?;

        match workspace.read_preferred(languages)? {
            Some((language, entries)) => Ok(TranscriptResult {
                entries,
                language,
                source: kind.source(),
            }),
            None => Err(TubescriptError::NoCaptions("no subtitle file written".to_string()).into()),
        }
    }
}

#[async_trait]
impl CaptionBackend for YtDlpCaptionBackend {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn attempt(&self, video_id: &VideoId, languages: &[String]) -> Result<TranscriptResult> {
        // Fail fast without spending two attempts on a missing binary.
        self.ytdlp.path()?;

        let mut reasons = Vec::new();
        for kind in [SubtitleKind::Manual, SubtitleKind::Auto] {
            match self.attempt_kind(kind, video_id, languages).await {
                Ok(result) => {
                    info!(
                        "yt-dlp found {} subtitles ({}) for {}",
                        result.source, result.language, video_id
                    );
                    return Ok(result);
                }
                Err(e) => {
                    debug!("yt-dlp {} attempt failed: {}", kind.flag(), e);
                    reasons.push(format!("{}: {}", kind.source(), e));
                }
            }
        }

        Err(TubescriptError::NoCaptions(format!(
            "yt-dlp could not find subtitles for {} in languages: {} ({})",
            video_id,
            languages.join(", "),
            reasons.join("; ")
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const SAMPLE: &str = r#"{"events": [{"tStartMs": 1000, "dDurationMs": 500, "segs": [{"utf8": "hi"}]}]}"#;

    #[test]
    fn test_workspace_prefers_requested_language_order() {
        let workspace = SubtitleWorkspace::new(&id()).unwrap();
        let dir = workspace.path();
        std::fs::write(dir.join("yt_dQw4w9WgXcQ.ko.json3"), SAMPLE).unwrap();
        std::fs::write(dir.join("yt_dQw4w9WgXcQ.en.json3"), SAMPLE).unwrap();
        std::fs::write(dir.join("yt_dQw4w9WgXcQ.info.json"), "{}").unwrap();

        let (lang, entries) = workspace
            .read_preferred(&langs(&["ja", "en", "ko"]))
            .unwrap()
            .unwrap();
        assert_eq!(lang, "en");
        assert_eq!(entries[0].text, "hi");
    }

    #[test]
    fn test_workspace_without_files() {
        let workspace = SubtitleWorkspace::new(&id()).unwrap();
        assert!(workspace.read_preferred(&langs(&["en"])).unwrap().is_none());
    }

    #[test]
    fn test_workspace_untagged_file_is_detected() {
        let workspace = SubtitleWorkspace::new(&id()).unwrap();
        std::fs::write(workspace.path().join("yt_dQw4w9WgXcQ.json3"), SAMPLE).unwrap();
        let (lang, _) = workspace.read_preferred(&langs(&["en"])).unwrap().unwrap();
        assert_eq!(lang, "detected");
    }

    #[test]
    fn test_workspace_removed_after_parse_failure() {
        let workspace = SubtitleWorkspace::new(&id()).unwrap();
        let dir = workspace.path().to_path_buf();
        std::fs::write(dir.join("yt_dQw4w9WgXcQ.en.json3"), "{ truncated").unwrap();

        assert!(workspace.read_preferred(&langs(&["en"])).is_err());
        drop(workspace);
        assert!(!dir.exists());
    }

    #[test]
    fn test_preference_rank_matches_region_variants() {
        let list = langs(&["ja", "en"]);
        assert_eq!(preference_rank(Some("ja"), &list), 0);
        assert_eq!(preference_rank(Some("en-US"), &list), 1);
        assert_eq!(preference_rank(Some("fr"), &list), 2);
        assert_eq!(preference_rank(None, &list), 2);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_before_any_attempt() {
        let backend = YtDlpCaptionBackend::new(YtDlp::unavailable(), Duration::from_secs(1));
        let err = backend.attempt(&id(), &langs(&["en"])).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TubescriptError>(),
            Some(TubescriptError::BackendUnavailable(_))
        ));
    }

    #[cfg(unix)]
    mod with_fake_ytdlp {
        use super::*;
        use crate::extractor::acquirer::TranscriptAcquirer;
        use crate::extractor::ytdlp::test_support::FakeYtDlp;
        use std::sync::Arc;

        /// Writes an English json3 file next to the `-o` template
        const WRITE_EN: &str = r#"printf '%s' '{"events": [{"tStartMs": 125400, "dDurationMs": 1000, "segs": [{"utf8": "hi "}, {"utf8": "there"}]}]}' > "$out.en.json3"
"#;

        fn backend(fake: &FakeYtDlp) -> YtDlpCaptionBackend {
            YtDlpCaptionBackend::new(fake.ytdlp.clone(), Duration::from_secs(10))
        }

        /// The workspace directory each run was pointed at
        fn workspaces(invocations: &[String]) -> Vec<PathBuf> {
            invocations
                .iter()
                .map(|line| {
                    let args: Vec<&str> = line.split(' ').collect();
                    let pos = args.iter().position(|a| *a == "-o").expect("-o argument");
                    Path::new(args[pos + 1]).parent().unwrap().to_path_buf()
                })
                .collect()
        }

        fn assert_cleaned_up(invocations: &[String]) {
            for dir in workspaces(invocations) {
                let name = dir.file_name().unwrap().to_string_lossy().to_string();
                assert!(name.starts_with("tubescript-"), "unexpected workspace {}", name);
                assert!(!dir.exists(), "{} was left behind", dir.display());
            }
        }

        #[tokio::test]
        async fn test_manual_then_auto_arguments() {
            let dir = tempfile::tempdir().unwrap();
            let body = format!("if [ \"$1\" = \"--write-auto-sub\" ]; then\n{}fi\n", WRITE_EN);
            let fake = FakeYtDlp::new(dir.path(), &body);

            let result = backend(&fake)
                .attempt(&id(), &langs(&["ja", "en"]))
                .await
                .unwrap();
            assert_eq!(result.source, TranscriptSource::AutoGenerated);
            assert_eq!(result.language, "en");
            assert_eq!(
                result.entries,
                vec![TranscriptEntry {
                    text: "hi there".to_string(),
                    start: 125.4,
                    duration: 1.0,
                }]
            );

            let runs = fake.invocations();
            assert_eq!(runs.len(), 2);
            let workspaces = workspaces(&runs);
            for (run, (flag, workspace)) in runs
                .iter()
                .zip(["--write-sub", "--write-auto-sub"].iter().zip(&workspaces))
            {
                let expected = format!(
                    "{} --sub-lang ja,en --sub-format json3 --skip-download --no-warnings -o {}/yt_dQw4w9WgXcQ https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                    flag,
                    workspace.display()
                );
                assert_eq!(run, &expected);
            }
            assert_ne!(workspaces[0], workspaces[1]);
            assert_cleaned_up(&runs);
        }

        #[tokio::test]
        async fn test_manual_subtitles_stop_after_first_run() {
            let dir = tempfile::tempdir().unwrap();
            let fake = FakeYtDlp::new(dir.path(), WRITE_EN);

            let result = backend(&fake).attempt(&id(), &langs(&["en"])).await.unwrap();
            assert_eq!(result.source, TranscriptSource::Manual);
            assert_eq!(result.language, "en");

            let runs = fake.invocations();
            assert_eq!(runs.len(), 1);
            assert!(runs[0].starts_with("--write-sub "));
            assert_cleaned_up(&runs);
        }

        #[tokio::test]
        async fn test_failed_manual_run_falls_through_to_auto() {
            let dir = tempfile::tempdir().unwrap();
            let body = format!(
                "if [ \"$1\" = \"--write-sub\" ]; then\n  echo 'ERROR: no subtitles' >&2\n  exit 1\nfi\n{}",
                WRITE_EN
            );
            let fake = FakeYtDlp::new(dir.path(), &body);

            let result = backend(&fake).attempt(&id(), &langs(&["en"])).await.unwrap();
            assert_eq!(result.source, TranscriptSource::AutoGenerated);
            assert_eq!(fake.invocations().len(), 2);
            assert_cleaned_up(&fake.invocations());
        }

        #[tokio::test]
        async fn test_both_runs_failing_is_one_diagnostic() {
            let dir = tempfile::tempdir().unwrap();
            let fake = FakeYtDlp::new(dir.path(), "echo 'ERROR: Private video' >&2\nexit 1\n");
            let acquirer = TranscriptAcquirer::new(vec![Arc::new(backend(&fake))]);

            match acquirer.acquire(&id(), &langs(&["en"])).await {
                Err(TubescriptError::NoTranscriptAvailable { diagnostics, .. }) => {
                    assert_eq!(diagnostics.len(), 1);
                    assert_eq!(diagnostics[0].backend, "yt-dlp");
                    assert!(diagnostics[0]
                        .reason
                        .starts_with("yt-dlp could not find subtitles for dQw4w9WgXcQ in languages: en"));
                    assert!(diagnostics[0]
                        .reason
                        .contains("manual: Extraction failed: ERROR: Private video"));
                    assert!(diagnostics[0]
                        .reason
                        .contains("auto-generated: Extraction failed: ERROR: Private video"));
                }
                other => panic!("expected NoTranscriptAvailable, got {:?}", other),
            }

            let runs = fake.invocations();
            assert_eq!(runs.len(), 2);
            assert_cleaned_up(&runs);
        }

        #[tokio::test]
        async fn test_unreadable_subtitles_still_cleaned_up() {
            let dir = tempfile::tempdir().unwrap();
            let fake = FakeYtDlp::new(dir.path(), "printf '{ truncated' > \"$out.en.json3\"\n");

            let err = backend(&fake).attempt(&id(), &langs(&["en"])).await.unwrap_err();
            assert!(err.to_string().contains("Invalid json3 subtitles"));
            assert_cleaned_up(&fake.invocations());
        }
    }
}
