//! In-process DNS server with scripted answers, for exercising the direct
//! lookup without a cluster.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::{A, SRV};
use hickory_proto::rr::{Name, RData, Record};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
enum Answer {
    Srv { target: String, port: u16 },
    A(Ipv4Addr),
}

/// Script for a [`FakeDns`]. Every query gets the same answers.
#[derive(Debug, Clone)]
pub struct FakeDnsBuilder {
    response_code: ResponseCode,
    answers: Vec<Answer>,
    silent: bool,
    truncate_udp: bool,
    junk_first: bool,
}

impl FakeDnsBuilder {
    pub fn srv(mut self, target: &str, port: u16) -> Self {
        self.answers.push(Answer::Srv {
            target: target.to_string(),
            port,
        });
        self
    }

    pub fn a(mut self, addr: Ipv4Addr) -> Self {
        self.answers.push(Answer::A(addr));
        self
    }

    pub fn response_code(mut self, code: ResponseCode) -> Self {
        self.response_code = code;
        self
    }

    /// Never answer
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Answer UDP queries with an empty truncated message, so clients have to
    /// ask again over TCP
    pub fn truncate_udp(mut self) -> Self {
        self.truncate_udp = true;
        self
    }

    /// Precede every UDP answer with a datagram that isn't a DNS message
    pub fn junk_first(mut self) -> Self {
        self.junk_first = true;
        self
    }

    /// Binds UDP and TCP on the same loopback port and starts answering.
    pub async fn start(self) -> io::Result<FakeDns> {
        let tcp = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = tcp.local_addr()?;
        let udp = UdpSocket::bind(addr).await?;

        let script = Arc::new(self);
        let queries = Arc::new(Mutex::new(Vec::new()));

        let udp_task = tokio::spawn(serve_udp(udp, script.clone(), queries.clone()));
        let tcp_task = tokio::spawn(serve_tcp(tcp, script, queries.clone()));

        Ok(FakeDns {
            addr,
            queries,
            tasks: vec![udp_task, tcp_task],
        })
    }

    fn respond(&self, request: &Message, over_udp: bool) -> Message {
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(request.recursion_desired())
            .set_recursion_available(true)
            .set_response_code(self.response_code);
        response.add_queries(request.queries().to_vec());

        if over_udp && self.truncate_udp {
            response.set_truncated(true);
            return response;
        }

        let owner = request
            .queries()
            .first()
            .map(|query| query.name().clone())
            .unwrap_or_else(Name::root);

        for answer in &self.answers {
            let rdata = match answer {
                Answer::Srv { target, port } => {
                    let target = Name::from_ascii(target).unwrap_or_else(|_| Name::root());
                    RData::SRV(SRV::new(0, 10, *port, target))
                }
                Answer::A(addr) => RData::A(A::from(*addr)),
            };
            response.add_answer(Record::from_rdata(owner.clone(), 30, rdata));
        }
        response
    }
}

/// Running fake server. Stops when dropped.
pub struct FakeDns {
    addr: SocketAddr,
    queries: Arc<Mutex<Vec<String>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl FakeDns {
    pub fn builder() -> FakeDnsBuilder {
        FakeDnsBuilder {
            response_code: ResponseCode::NoError,
            answers: Vec::new(),
            silent: false,
            truncate_udp: false,
            junk_first: false,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Names queried so far, UDP and TCP alike
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl Drop for FakeDns {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn record_query(queries: &Mutex<Vec<String>>, request: &Message) {
    if let (Ok(mut seen), Some(query)) = (queries.lock(), request.queries().first()) {
        seen.push(query.name().to_utf8());
    }
}

async fn serve_udp(socket: UdpSocket, script: Arc<FakeDnsBuilder>, queries: Arc<Mutex<Vec<String>>>) {
    let mut buf = vec![0u8; 4096];
    loop {
        let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
            return;
        };
        let Ok(request) = Message::from_vec(&buf[..len]) else {
            continue;
        };
        record_query(&queries, &request);
        if script.silent {
            continue;
        }

        if script.junk_first {
            let _ = socket.send_to(&[0xde, 0xad, 0xbe], peer).await;
        }
        if let Ok(bytes) = script.respond(&request, true).to_vec() {
            let _ = socket.send_to(&bytes, peer).await;
        }
    }
}

async fn serve_tcp(listener: TcpListener, script: Arc<FakeDnsBuilder>, queries: Arc<Mutex<Vec<String>>>) {
    while let Ok((stream, _)) = listener.accept().await {
        let script = script.clone();
        let queries = queries.clone();
        tokio::spawn(async move {
            let _ = answer_tcp(stream, &script, &queries).await;
        });
    }
}

async fn answer_tcp(mut stream: TcpStream, script: &FakeDnsBuilder, queries: &Mutex<Vec<String>>) -> io::Result<()> {
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut buf).await?;

    let request = Message::from_vec(&buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    record_query(queries, &request);
    if script.silent {
        return Ok(());
    }

    let bytes = script
        .respond(&request, false)
        .to_vec()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = u16::try_from(bytes.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&bytes).await
}
