use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// NETCONF 1.0 end-of-message marker
pub const NETCONF_DELIMITER: &str = "]]>]]>";

const NETCONF_HELLO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <capabilities>
    <capability>urn:ietf:params:netconf:base:1.0</capability>
  </capabilities>
</hello>]]>]]>"#;

const NETCONF_GET_RUNNING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rpc message-id="101" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <get-config>
    <source><running/></source>
  </get-config>
</rpc>]]>]]>"#;

const NETCONF_CLOSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rpc message-id="102" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <close-session/>
</rpc>]]>]]>"#;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// libssh2 takes its blocking timeout in milliseconds as a u32
fn session_timeout_ms(timeout_secs: u64) -> u32 {
    u32::try_from(timeout_secs.saturating_mul(1000)).unwrap_or(u32::MAX)
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// Returns the authenticated Session. Uses the ssh2 crate (libssh2).
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    timeout_secs: u64,
) -> Result<ssh2::Session, String> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("Invalid address {}:{}: {}", host, port, e))?
        .next()
        .ok_or_else(|| format!("No address found for {}:{}", host, port))?;

    // A zero duration is rejected by connect_timeout
    let timeout_secs = timeout_secs.max(1);
    let tcp = TcpStream::connect_timeout(&addr, Duration::from_secs(timeout_secs))
        .map_err(|e| format!("TCP connection failed: {}", e))?;

    tcp.set_read_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();
    tcp.set_write_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| format!("Failed to create SSH session: {}", e))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(session_timeout_ms(timeout_secs));
    session.handshake()
        .map_err(|e| format!("SSH handshake failed: {}", e))?;

    // Try password auth first
    match session.userauth_password(user, pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // Try keyboard-interactive auth (needed for some IOS and EOS builds)
    let mut prompter = PasswordPrompt { password: pass.to_string() };
    let _ = session.userauth_keyboard_interactive(user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err("SSH authentication failed: all methods exhausted".to_string())
    }
}

/// Connect via SSH and run a single command, returning the output.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_run_command(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    command: &str,
    timeout_secs: u64,
) -> Result<String, String> {
    let session = ssh_connect(host, port, user, pass, timeout_secs)?;

    let mut channel = session.channel_session()
        .map_err(|e| format!("Failed to open channel: {}", e))?;

    channel.exec(command)
        .map_err(|e| format!("Failed to execute command: {}", e))?;

    let mut output = String::new();
    channel.read_to_string(&mut output)
        .map_err(|e| format!("Failed to read output: {}", e))?;

    channel.wait_close()
        .map_err(|e| format!("Failed to close channel: {}", e))?;

    Ok(output)
}

/// Async wrapper for ssh_run_command - runs in a blocking thread pool
pub async fn ssh_run_command_async(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    command: &str,
    timeout_secs: u64,
) -> Result<String, String> {
    let host = host.to_string();
    let user = user.to_string();
    let pass = pass.to_string();
    let command = command.to_string();

    tokio::task::spawn_blocking(move || {
        ssh_run_command(&host, port, &user, &pass, &command, timeout_secs)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Read from a NETCONF stream until the end-of-message marker.
/// Returns the message without the marker.
pub fn read_netconf_message<R: Read>(reader: &mut R) -> Result<String, String> {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    let delimiter = NETCONF_DELIMITER.as_bytes();

    loop {
        let n = reader
            .read(&mut chunk)
            .map_err(|e| format!("Failed to read NETCONF reply: {}", e))?;
        if n == 0 {
            return Err("NETCONF session closed before end of message".to_string());
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buf.windows(delimiter.len()).position(|w| w == delimiter) {
            buf.truncate(pos);
            return Ok(String::from_utf8_lossy(&buf).trim().to_string());
        }
    }
}

/// Extract the error message of an <rpc-error> reply, if any
pub fn netconf_rpc_error(reply: &str) -> Option<String> {
    if !reply.contains("rpc-error>") {
        return None;
    }
    let message = reply
        .split_once("<error-message")
        .and_then(|(_, rest)| rest.split_once('>'))
        .and_then(|(_, rest)| rest.split_once("</error-message>"))
        .map(|(msg, _)| msg.trim().to_string())
        .filter(|msg| !msg.is_empty());
    Some(message.unwrap_or_else(|| "unspecified rpc-error".to_string()))
}

/// Fetch the running datastore over the NETCONF SSH subsystem.
/// This is blocking, so call from a spawn_blocking context.
pub fn netconf_get_config(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    timeout_secs: u64,
) -> Result<String, String> {
    let session = ssh_connect(host, port, user, pass, timeout_secs)?;

    let mut channel = session.channel_session()
        .map_err(|e| format!("Failed to open channel: {}", e))?;
    channel.subsystem("netconf")
        .map_err(|e| format!("Failed to start netconf subsystem: {}", e))?;

    channel.write_all(NETCONF_HELLO.as_bytes())
        .map_err(|e| format!("Failed to send hello: {}", e))?;
    let _server_hello = read_netconf_message(&mut channel)?;

    channel.write_all(NETCONF_GET_RUNNING.as_bytes())
        .map_err(|e| format!("Failed to send get-config: {}", e))?;
    let reply = read_netconf_message(&mut channel)?;

    if channel.write_all(NETCONF_CLOSE.as_bytes()).is_ok() {
        let _ = read_netconf_message(&mut channel);
    }
    let _ = channel.close();

    if let Some(err) = netconf_rpc_error(&reply) {
        return Err(format!("NETCONF rpc-error: {}", err));
    }

    Ok(reply)
}

/// Async wrapper for netconf_get_config - runs in a blocking thread pool
pub async fn netconf_get_config_async(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    timeout_secs: u64,
) -> Result<String, String> {
    let host = host.to_string();
    let user = user.to_string();
    let pass = pass.to_string();

    tokio::task::spawn_blocking(move || {
        netconf_get_config(&host, port, &user, &pass, timeout_secs)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}
