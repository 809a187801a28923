//! Exercises the subprocess-backed tools against small fake shell scripts

#[cfg(unix)]
mod unix {
    use odyssea_audio::{
        RhubarbConfig, RhubarbLipSync, SystemVoiceConfig, SystemVoiceSynthesizer, VoiceEngine,
    };
    use odyssea_core::{LipSyncAnalyzer, OdysseaError, SpeechSynthesizer};
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn rhubarb(bin: PathBuf, timeout_ms: u64) -> RhubarbLipSync {
        RhubarbLipSync::new(RhubarbConfig {
            bin,
            recognizer: "phonetic".into(),
            timeout_ms,
        })
    }

    // Writes a timing document to the path following `-o`
    const FAKE_RHUBARB: &str = r#"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
echo '{"mouthCues":[{"start":0.0,"end":0.2,"value":"X"}]}' > "$out"
"#;

    #[tokio::test]
    async fn rhubarb_writes_timing_document() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "rhubarb", FAKE_RHUBARB);
        let audio = dir.path().join("message_x_0.wav");
        let timing = dir.path().join("message_x_0.json");
        std::fs::write(&audio, b"RIFF").unwrap();

        rhubarb(bin, 5_000).analyze(&audio, &timing).await.unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&timing).unwrap()).unwrap();
        assert_eq!(doc["mouthCues"][0]["value"], "X");
    }

    #[tokio::test]
    async fn rhubarb_nonzero_exit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "rhubarb", "echo 'bad wav' >&2\nexit 3");

        match rhubarb(bin, 5_000)
            .analyze(&dir.path().join("a.wav"), &dir.path().join("a.json"))
            .await
        {
            Err(OdysseaError::LipSync(msg)) => assert!(msg.contains("bad wav")),
            other => panic!("expected lip-sync error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rhubarb_without_output_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "rhubarb", "exit 0");

        let err = rhubarb(bin, 5_000)
            .analyze(&dir.path().join("a.wav"), &dir.path().join("a.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, OdysseaError::LipSync(_)));
    }

    #[tokio::test]
    async fn rhubarb_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "rhubarb", "sleep 5");

        match rhubarb(bin, 100)
            .analyze(&dir.path().join("a.wav"), &dir.path().join("a.json"))
            .await
        {
            Err(OdysseaError::LipSync(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    fn voice_config(dir: &Path, espeak: PathBuf) -> SystemVoiceConfig {
        SystemVoiceConfig {
            temp_dir: dir.to_path_buf(),
            timeout_ms: 5_000,
            voice: None,
            rate: 1.0,
            piper_bin: None,
            piper_voice: None,
            piper_voice_dir: None,
            espeak_bin: Some(espeak),
        }
    }

    // Writes the text read from stdin to the path following `-w`; any
    // unexpected argument is treated like espeak-ng treats an unknown option
    const FAKE_ESPEAK: &str = r#"
out=""
stdin=0
while [ $# -gt 0 ]; do
  case "$1" in
    -w) out="$2"; shift ;;
    -v|-s) shift ;;
    --stdin) stdin=1 ;;
    *) echo "unexpected argument: $1" >&2; exit 1 ;;
  esac
  shift
done
[ "$stdin" = 1 ] || exit 1
printf 'RIFF....WAVE' > "$out"
cat >> "$out"
"#;

    #[tokio::test]
    async fn espeak_output_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "espeak-ng", FAKE_ESPEAK);
        let tts = SystemVoiceSynthesizer::new(voice_config(dir.path(), bin.clone()));
        assert_eq!(tts.engine(), Some(&VoiceEngine::Espeak { bin }));
        assert_eq!(tts.name(), "espeak-ng");

        let bytes = tts.synthesize("Good evening").await.unwrap();
        assert_eq!(bytes, b"RIFF....WAVEGood evening");
    }

    #[tokio::test]
    async fn espeak_speaks_hyphen_leading_text() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "espeak-ng", FAKE_ESPEAK);
        let tts = SystemVoiceSynthesizer::new(voice_config(dir.path(), bin));

        let bytes = tts
            .synthesize("- Email: megacertgt@gmail.com")
            .await
            .unwrap();
        assert_eq!(bytes, b"RIFF....WAVE- Email: megacertgt@gmail.com");
    }

    #[tokio::test]
    async fn espeak_empty_output_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "espeak-ng", "exit 0");
        let tts = SystemVoiceSynthesizer::new(voice_config(dir.path(), bin));

        let err = tts.synthesize("hi").await.unwrap_err();
        assert!(matches!(err, OdysseaError::Synthesis(_)));
    }

    #[tokio::test]
    async fn piper_reads_text_from_stdin() {
        let dir = tempfile::tempdir().unwrap();
        // `-m model -f out --length_scale x`, text on stdin
        let bin = write_script(dir.path(), "piper", r#"cat > "$4""#);
        let model = dir.path().join("en_US-amy.onnx");
        std::fs::write(&model, b"model").unwrap();
        let cfg = SystemVoiceConfig {
            piper_bin: Some(bin),
            piper_voice: Some(model),
            espeak_bin: None,
            ..voice_config(dir.path(), PathBuf::new())
        };
        let tts = SystemVoiceSynthesizer::new(cfg);
        assert_eq!(tts.name(), "piper");

        let bytes = tts.synthesize("From stdin").await.unwrap();
        assert_eq!(bytes, b"From stdin");
    }

    #[test]
    #[serial]
    fn rhubarb_config_reads_env() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(dir.path(), "rhubarb", "exit 0");
        std::env::set_var("RHUBARB_BIN", &bin);
        std::env::set_var("RHUBARB_RECOGNIZER", "pocketSphinx");
        std::env::remove_var("RHUBARB_TIMEOUT_MS");

        let cfg = RhubarbConfig::default();
        assert_eq!(cfg.bin, bin);
        assert_eq!(cfg.recognizer, "pocketSphinx");
        assert_eq!(cfg.timeout_ms, 60_000);

        std::env::remove_var("RHUBARB_BIN");
        std::env::remove_var("RHUBARB_RECOGNIZER");
    }

    #[test]
    #[serial]
    fn system_voice_config_reads_env() {
        let dir = tempfile::tempdir().unwrap();
        let espeak = write_script(dir.path(), "espeak-ng", "exit 0");
        std::env::set_var("ESPEAK_BIN", &espeak);
        std::env::set_var("TTS_VOICE", "en-us+f3");
        std::env::set_var("TTS_RATE", "1.25");
        std::env::remove_var("TTS_TIMEOUT_MS");

        let cfg = SystemVoiceConfig::default();
        assert_eq!(cfg.espeak_bin.as_deref(), Some(espeak.as_path()));
        assert_eq!(cfg.voice.as_deref(), Some("en-us+f3"));
        assert_eq!(cfg.rate, 1.25);
        assert_eq!(cfg.timeout_ms, 20_000);

        std::env::remove_var("ESPEAK_BIN");
        std::env::remove_var("TTS_VOICE");
        std::env::remove_var("TTS_RATE");
    }
}
