//! Integration tests for the WebSocket client transport.
//!
//! These tests spin up a real WebSocket server with `tokio-tungstenite`
//! and point our client connector at it, so frames actually cross a
//! TCP socket.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use parley_transport::{
        Connection, Connector, TransportError, WebSocketConnector,
    };
    use tokio::net::TcpListener;
    use tokio_tungstenite::WebSocketStream;
    use tokio_tungstenite::tungstenite::Message;

    /// Binds a listener on an OS-assigned port and returns it together
    /// with the `ws://` URL a client should dial.
    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");
        (listener, format!("ws://{addr}/chat"))
    }

    async fn accept(
        listener: &TcpListener,
    ) -> WebSocketStream<tokio::net::TcpStream> {
        let (stream, _) = listener.accept().await.expect("should accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake should succeed")
    }

    #[tokio::test]
    async fn test_websocket_send_and_receive_text_frames() {
        let (listener, url) = listen().await;

        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;

            // Client → server arrives as a text frame.
            let msg = ws.next().await.unwrap().unwrap();
            assert!(msg.is_text(), "JSON frames should travel as text");
            assert_eq!(msg.into_text().unwrap().as_str(), r#"{"kind":"hi"}"#);

            // Server → client.
            ws.send(Message::Text(r#"{"kind":"hello"}"#.into()))
                .await
                .unwrap();
            ws
        });

        let conn = WebSocketConnector
            .connect(&url)
            .await
            .expect("client should connect");
        assert!(conn.id().into_inner() > 0);

        conn.send(br#"{"kind":"hi"}"#).await.expect("send should succeed");
        let received = conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"kind":"hello"}"#);

        let _ws = server.await.expect("server task should complete");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_server_close() {
        let (listener, url) = listen().await;

        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            ws.send(Message::Close(None)).await.unwrap();
            // Drain until the client acknowledges the close.
            while let Some(Ok(_)) = ws.next().await {}
        });

        let conn = WebSocketConnector.connect(&url).await.unwrap();
        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on server close");

        // The server only finishes once our reply Close arrives; `conn`
        // is still alive here, so a dropped socket can't stand in for it.
        tokio::time::timeout(std::time::Duration::from_secs(2), server)
            .await
            .expect("client should answer the close handshake")
            .unwrap();
        drop(conn);
    }

    #[tokio::test]
    async fn test_client_close_is_seen_by_server() {
        let (listener, url) = listen().await;

        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None => true,
                _ => false,
            }
        });

        let conn = WebSocketConnector.connect(&url).await.unwrap();
        conn.close().await.expect("close should succeed");

        assert!(server.await.unwrap(), "server should observe the close");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        // Bind then drop so the port is (almost certainly) unused.
        let (listener, url) = listen().await;
        drop(listener);

        let err = WebSocketConnector.connect(&url).await.err().unwrap();
        assert!(matches!(err, TransportError::ConnectFailed { .. }));
    }
}
