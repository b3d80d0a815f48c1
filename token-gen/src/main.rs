use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::Parser;
use ed25519_dalek::{Signer, SigningKey, pkcs8::DecodePrivateKey};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Mint a bearer credential for calling the consent admin API by hand.
///
/// - With `--private-pem` the token is signed with Ed25519 (alg=EdDSA), matching
///   a server configured with `ACCESS_JWT_PUBLIC_KEY_PEM`.
/// - Without it the token is unsigned (alg=none, dummy signature segment), for a
///   server that trusts an upstream gateway to verify signatures.
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Subject (user id), e.g. carol or carol@carbon.super
    #[arg(long)]
    sub: String,

    /// Space separated scopes, e.g. "openid consents:read_all"
    #[arg(long, default_value = "")]
    scope: String,

    /// Ed25519 private key in PEM (PKCS#8). Omit for an unsigned token.
    #[arg(long, value_name = "FILE")]
    private_pem: Option<PathBuf>,

    #[arg(long)]
    iss: Option<String>,

    #[arg(long)]
    aud: Option<String>,

    /// Lifetime in seconds from now.
    #[arg(long, default_value_t = 300)]
    ttl: i64,

    /// Override jti. Default: random UUID v4.
    #[arg(long)]
    jti: Option<String>,

    /// Print the full `Authorization` header value instead of the bare token.
    #[arg(long, default_value_t = false)]
    header: bool,
}

fn b64url_json(value: &Value) -> Result<String, serde_json::Error> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

fn now_unix() -> Result<i64, std::time::SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

fn claims(args: &Args, iat: i64) -> Value {
    let mut claims = Map::new();
    claims.insert("sub".into(), Value::String(args.sub.clone()));
    claims.insert("scope".into(), Value::String(args.scope.clone()));
    claims.insert("iat".into(), iat.into());
    claims.insert("exp".into(), (iat + args.ttl).into());
    claims.insert(
        "jti".into(),
        Value::String(
            args.jti
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        ),
    );
    if let Some(iss) = &args.iss {
        claims.insert("iss".into(), Value::String(iss.clone()));
    }
    if let Some(aud) = &args.aud {
        claims.insert("aud".into(), Value::String(aud.clone()));
    }
    Value::Object(claims)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let payload = claims(&args, now_unix()?);

    let token = match &args.private_pem {
        Some(path) => {
            let pem = fs::read_to_string(path)?;
            let signing_key = SigningKey::from_pkcs8_pem(&pem)?;

            let header = json!({"typ": "JWT", "alg": "EdDSA"});
            let signing_input = format!("{}.{}", b64url_json(&header)?, b64url_json(&payload)?);
            let sig = signing_key.sign(signing_input.as_bytes());

            format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(sig.to_bytes()))
        }
        None => {
            let header = json!({"typ": "JWT", "alg": "none"});
            format!("{}.{}.unsigned", b64url_json(&header)?, b64url_json(&payload)?)
        }
    };

    if args.header {
        println!("Bearer {}", token);
    } else {
        println!("{}", token);
    }

    Ok(())
}
