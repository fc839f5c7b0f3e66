#![allow(dead_code)]

pub mod mock_api {
    //! In-process stand-in for the user API, served by `tiny_http`.
    //!
    //! Mirrors the real service closely enough for the load test: users are created with a
    //! string id, can be read back by that id, every user endpoint requires the API key, and
    //! the health check needs no credentials.

    use std::collections::HashMap;
    use std::io::Read;
    use std::net::{SocketAddr, TcpListener};
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;

    use serde_json::{json, Value};
    use tiny_http::{Header, Method, Response, Server};

    pub const BASE_PATH: &str = "/dev/api/v1";

    /// How the mock answers `POST /users`.
    #[derive(Debug, Clone)]
    pub enum CreateMode {
        /// Store the user and answer 200 with it
        Normal,
        /// Answer with this status and an error body
        Status(u16),
        /// Answer 200 with this raw body
        Body(String),
    }

    /// A request the mock received.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: String,
        pub url: String,
        /// Header names lowercased
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            let name = name.to_ascii_lowercase();
            self.headers
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str())
        }
    }

    struct State {
        api_key: String,
        mode: CreateMode,
        users: HashMap<String, Value>,
        next_id: u64,
        recorded: Vec<RecordedRequest>,
    }

    pub struct MockApi {
        server: Arc<Server>,
        state: Arc<Mutex<State>>,
        handle: Option<JoinHandle<()>>,
        addr: SocketAddr,
    }

    impl MockApi {
        pub fn start(api_key: &str, mode: CreateMode) -> Self {
            let server = Arc::new(Server::http("127.0.0.1:0").expect("bind mock API"));
            let addr = server
                .server_addr()
                .to_ip()
                .expect("mock API listens on TCP");
            let state = Arc::new(Mutex::new(State {
                api_key: api_key.to_string(),
                mode,
                users: HashMap::new(),
                next_id: 1,
                recorded: Vec::new(),
            }));

            let handle = {
                let server = Arc::clone(&server);
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for mut request in server.incoming_requests() {
                        let mut body = String::new();
                        let _ = request.as_reader().read_to_string(&mut body);
                        let recorded = RecordedRequest {
                            method: request.method().to_string(),
                            url: request.url().to_string(),
                            headers: request
                                .headers()
                                .iter()
                                .map(|h| (h.field.to_string().to_ascii_lowercase(), h.value.to_string()))
                                .collect(),
                            body,
                        };

                        let (status, reply) = {
                            let mut state = state.lock().unwrap();
                            let reply = handle(&mut state, request.method(), &recorded);
                            state.recorded.push(recorded);
                            reply
                        };

                        let response = Response::from_string(reply)
                            .with_status_code(status)
                            .with_header(
                                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                                    .unwrap(),
                            );
                        let _ = request.respond(response);
                    }
                })
            };

            Self {
                server,
                state,
                handle: Some(handle),
                addr,
            }
        }

        /// `http://127.0.0.1:<port>`
        pub fn host(&self) -> String {
            format!("http://{}", self.addr)
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.state.lock().unwrap().recorded.clone()
        }

        pub fn user_count(&self) -> usize {
            self.state.lock().unwrap().users.len()
        }
    }

    impl Drop for MockApi {
        fn drop(&mut self) {
            self.server.unblock();
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn error(status: u16, message: &str) -> (u16, String) {
        (status, json!({ "error": message }).to_string())
    }

    fn handle(state: &mut State, method: &Method, request: &RecordedRequest) -> (u16, String) {
        let Some(path) = request.url.strip_prefix(BASE_PATH) else {
            return error(404, "not found");
        };

        if *method == Method::Get && path == "/healthCheck" {
            return (200, json!({ "status": "ok" }).to_string());
        }

        if !path.starts_with("/users") {
            return error(404, "not found");
        }
        if request.header("x-api-key") != Some(state.api_key.as_str()) {
            return error(401, "invalid API key");
        }

        match (method, path) {
            (Method::Post, "/users") => match state.mode.clone() {
                CreateMode::Status(status) => error(status, "create user failed"),
                CreateMode::Body(body) => (200, body),
                CreateMode::Normal => {
                    let input: Value = match serde_json::from_str(&request.body) {
                        Ok(value) => value,
                        Err(_) => return error(400, "invalid request body"),
                    };
                    let (Some(name), Some(email)) = (input["name"].as_str(), input["email"].as_str())
                    else {
                        return error(400, "name and email are required");
                    };
                    let id = format!("usr-{}", state.next_id);
                    state.next_id += 1;
                    let user = json!({ "id": id, "name": name, "email": email });
                    state.users.insert(id, user.clone());
                    (200, user.to_string())
                }
            },
            (Method::Get, _) => match path.strip_prefix("/users/") {
                Some(id) => match state.users.get(id) {
                    Some(user) => (200, user.to_string()),
                    None => error(404, "user not found"),
                },
                None => error(404, "not found"),
            },
            _ => error(405, "method not allowed"),
        }
    }

    /// An address nothing listens on.
    pub fn closed_host() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }
}
