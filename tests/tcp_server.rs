use boardd::bbs::BbsServer;
use boardd::config::Config;
use std::collections::HashSet;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
mod common;
use common::{read_reply, send_line};

async fn start_server() -> (std::net::SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let mut cfg = Config::default();
    cfg.network.port = 0;
    let mut server = BbsServer::new(cfg).await.expect("server");
    let addr = server.bind().await.expect("bind");
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        server
            .run_until(async {
                let _ = rx.await;
            })
            .await
            .expect("run");
    });
    (addr, tx, handle)
}

#[tokio::test]
async fn serves_commands_over_tcp() {
    let (addr, stop, handle) = start_server().await;
    let stream = TcpStream::connect(addr).await.expect("connect");
    let (r, mut w) = stream.into_split();
    let mut r = BufReader::new(r);

    send_line(&mut w, "%connect 127.0.0.1 5000").await;
    assert_eq!(
        read_reply(&mut r).await.as_deref(),
        Some("Connected to the bulletin board server at 127.0.0.1:5000.")
    );
    send_line(&mut w, "%groups").await;
    let groups = read_reply(&mut r).await.unwrap();
    assert_eq!(groups.lines().count(), 5);
    assert!(groups.starts_with("ID: 1, Name: Group Alpha"));
    send_line(&mut w, "%exit").await;
    assert_eq!(read_reply(&mut r).await.as_deref(), Some("Goodbye!"));
    assert_eq!(read_reply(&mut r).await, None);

    stop.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn concurrent_clients_never_share_post_ids() {
    let (addr, stop, handle) = start_server().await;

    let mut clients = Vec::new();
    for n in 0..10 {
        clients.push(tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.expect("connect");
            let (r, mut w) = stream.into_split();
            let mut r = BufReader::new(r);
            let name = format!("user{}", n);
            send_line(&mut w, &format!("%join {}", name)).await;
            read_reply(&mut r).await.expect("join reply");
            let mut ids = Vec::new();
            for i in 0..20 {
                send_line(&mut w, &format!("%post {} 2024-01-01 s{} body {}", name, i, i)).await;
                let reply = read_reply(&mut r).await.expect("post reply");
                let id: u64 = reply
                    .strip_prefix("Message posted with ID ")
                    .expect("post ack")
                    .parse()
                    .expect("numeric id");
                ids.push(id);
            }
            // Ids seen by one client increase with each of its posts
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            send_line(&mut w, "%exit").await;
            read_reply(&mut r).await;
            ids
        }));
    }

    let mut all = HashSet::new();
    for c in clients {
        for id in c.await.unwrap() {
            assert!(all.insert(id), "id {} issued twice", id);
        }
    }
    assert_eq!(all.len(), 200);
    assert_eq!(all, (1..=200).collect::<HashSet<u64>>());

    stop.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn invalid_config_is_refused() {
    let mut cfg = Config::default();
    cfg.groups[1].id = cfg.groups[0].id.clone();
    assert!(BbsServer::new(cfg).await.is_err());
}
