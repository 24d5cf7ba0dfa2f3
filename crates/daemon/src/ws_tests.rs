// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn token_extraction_from_query() {
    assert_eq!(
        token_from_query("/ws?token=secret"),
        Some("secret".to_string())
    );
    assert_eq!(
        token_from_query("/ws?foo=1&token=abc"),
        Some("abc".to_string())
    );
    assert_eq!(token_from_query("/ws"), None);
    assert_eq!(token_from_query("/ws?other=x"), None);
}

#[test]
fn client_frames_parse() {
    let frame: ClientFrame =
        serde_json::from_str(r#"{"type":"terminal_input","session_id":"s1","keys":"ls\n"}"#)
            .unwrap();
    assert!(matches!(frame, ClientFrame::TerminalInput { .. }));

    let frame: ClientFrame =
        serde_json::from_str(r#"{"type":"terminal_resize","session_id":"s1","cols":80,"rows":24}"#)
            .unwrap();
    assert!(matches!(frame, ClientFrame::TerminalResize { cols: 80, rows: 24, .. }));

    let frame: ClientFrame =
        serde_json::from_str(r#"{"type":"subscribe","windows":["w:0"]}"#).unwrap();
    assert!(matches!(frame, ClientFrame::Subscribe { .. }));

    assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"evil"}"#).is_err());
}
