pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# ELB2LOKI CONFIGURATION
# =============================================================================
# Receives storage notifications for load balancer access logs, fetches each
# gzip'd log object, parses it and pushes the lines to a Loki-compatible
# ingestion endpoint.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/elb2loki/config.yml
#   3. /etc/elb2loki/config.yml
#
# Values written as $env{...} are filled in from the environment.
# LOKI_URL, LOKI_USER and LOKI_TOKEN override the ingest settings below.

server:
  # Address the notification webhook listens on (POST /)
  listen: 0.0.0.0:8080

ingest:
  endpoint: https://logs-prod.example.net/loki/api/v1/push
  user: "$env{LOKI_USER}"
  token: "$env{LOKI_TOKEN}"
  # Stream labels. Give every running instance its own job, otherwise their
  # entries interleave out of order within one stream.
  # Defaults to elb2loki-<hostname>.
  # job: alb-ingest
  level: info
  timeout: 10s
  # Entries per push request
  max_batch_entries: 1000

storage:
  # local: objects read from <root>/<bucket>/<key>
  # http:  objects fetched from <base_url>/<bucket>/<key>
  backend: local
  root: /var/lib/elb2loki/buckets
  # backend: http
  # base_url: http://127.0.0.1:9000
  timeout: 30s

pipeline:
  # Log objects fetched and pushed concurrently
  max_in_flight: 64
"#
    .to_string()
}
