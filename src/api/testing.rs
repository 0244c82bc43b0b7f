// ============================================================================
// Serveur HTTP local pour les tests réseau
// ============================================================================
// Un TcpListener sur 127.0.0.1 qui répond, connexion par connexion, avec des
// réponses HTTP écrites à la main. Les en-têtes de chaque requête reçue sont
// conservés pour vérification.
// ============================================================================

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Requêtes reçues (ligne de requête + en-têtes), dans l'ordre
pub type Received = Arc<Mutex<Vec<String>>>;

/// Construit une réponse HTTP/1.1 complète ; la connexion est fermée ensuite
pub fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {}\r\n", status);
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    response
}

/// Démarre un serveur qui sert `responses` dans l'ordre, une par connexion
///
/// Retourne l'URL de base (`http://127.0.0.1:<port>`) et les requêtes reçues.
pub async fn serve(responses: Vec<String>) -> (String, Received) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let log = received.clone();
    tokio::spawn(async move {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let head = read_head(&mut stream).await;
            log.lock().unwrap().push(head);
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (base, received)
}

/// Démarre un serveur qui accepte les connexions mais ne répond jamais
pub async fn serve_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            // Garder la socket ouverte : le client attend jusqu'au timeout
            open.push(stream);
        }
    });

    base
}

/// Lit la requête jusqu'à la fin des en-têtes (les GET n'ont pas de corps)
async fn read_head(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 1024];

    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => data.extend_from_slice(&chunk[..n]),
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}
