use crate::{finding::Finding, module::ModuleError, severity::Severity};

use super::parser::ParsedDockerfile;

type CheckResult = Result<Vec<Finding>, ModuleError>;

const PIN_RECOMMENDATION: &str =
    "Pin image to a specific digest or immutable tag (e.g., ubuntu:22.04)";

/// Sensitive service ports that should not be exposed casually.
const RISKY_PORTS: [(u16, &str); 6] = [
    (22, "SSH"),
    (23, "Telnet"),
    (3306, "MySQL"),
    (5432, "PostgreSQL"),
    (6379, "Redis"),
    (27017, "MongoDB"),
];

enum ImageTag<'a> {
    Untagged,
    Tagged(&'a str),
    Digest,
}

fn image_tag(image: &str) -> ImageTag<'_> {
    if image.contains('@') {
        return ImageTag::Digest;
    }
    // A colon before the last slash belongs to a registry port.
    let name_start = image.rfind('/').map_or(0, |idx| idx + 1);
    match image[name_start..].split_once(':') {
        Some((_, tag)) => ImageTag::Tagged(tag),
        None => ImageTag::Untagged,
    }
}

/// `FROM` images that are untagged or use the mutable `latest` tag.
pub fn latest_tag(df: &ParsedDockerfile) -> CheckResult {
    let mut findings = Vec::new();
    for instr in df.instructions_named("FROM") {
        let Some(image) = instr
            .args
            .split_whitespace()
            .find(|token| !token.starts_with("--"))
        else {
            continue;
        };
        if image.eq_ignore_ascii_case("scratch") {
            continue;
        }
        let message = match image_tag(image) {
            ImageTag::Untagged => format!(
                "FROM uses untagged image {image:?} (defaults to :latest) at line {}",
                instr.line
            ),
            ImageTag::Tagged("latest") => {
                format!("FROM uses mutable :latest tag: {image:?} at line {}", instr.line)
            }
            ImageTag::Tagged(_) | ImageTag::Digest => continue,
        };
        findings.push(
            Finding::new(
                "dockerfile-latest-tag",
                Severity::Medium,
                df.location(instr),
                message,
            )
            .with_recommendation(PIN_RECOMMENDATION),
        );
    }
    Ok(findings)
}

/// No `USER` switches away from root.
pub fn runs_as_root(df: &ParsedDockerfile) -> CheckResult {
    let non_root = df.instructions_named("USER").any(|instr| {
        let user = instr.args.trim();
        user != "0" && user != "root"
    });
    if non_root {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::new(
        "dockerfile-runs-as-root",
        Severity::High,
        df.path.display().to_string(),
        "Dockerfile has no USER directive; container will run as root",
    )
    .with_recommendation("Add a USER directive with a non-root user (e.g., USER 1001)")])
}

pub fn no_healthcheck(df: &ParsedDockerfile) -> CheckResult {
    if df.instructions_named("HEALTHCHECK").next().is_some() {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::new(
        "dockerfile-no-healthcheck",
        Severity::Low,
        df.path.display().to_string(),
        "Dockerfile has no HEALTHCHECK instruction",
    )
    .with_recommendation(
        "Add HEALTHCHECK to allow container orchestrators to monitor service health",
    )])
}

pub fn no_multi_stage(df: &ParsedDockerfile) -> CheckResult {
    if df.instructions_named("FROM").count() >= 2 {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::new(
        "dockerfile-no-multi-stage",
        Severity::Low,
        df.path.display().to_string(),
        "Dockerfile uses a single-stage build",
    )
    .with_recommendation(
        "Consider multi-stage builds to reduce final image size and exclude build tools",
    )])
}

/// `EXPOSE` of one of [`RISKY_PORTS`]; protocol suffixes are ignored.
pub fn risky_expose(df: &ParsedDockerfile) -> CheckResult {
    let mut findings = Vec::new();
    for instr in df.instructions_named("EXPOSE") {
        for token in instr.args.split_whitespace() {
            let port_str = token.split('/').next().unwrap_or(token);
            let Ok(port) = port_str.parse::<u16>() else {
                continue;
            };
            let Some((_, service)) = RISKY_PORTS.iter().find(|(risky, _)| *risky == port) else {
                continue;
            };
            findings.push(
                Finding::new(
                    "dockerfile-risky-expose",
                    Severity::Medium,
                    df.location(instr),
                    format!(
                        "EXPOSE includes risky port {port} ({service}) at line {}",
                        instr.line
                    ),
                )
                .with_recommendation(format!(
                    "Avoid exposing sensitive service port {port} unless intentional"
                )),
            );
        }
    }
    Ok(findings)
}
