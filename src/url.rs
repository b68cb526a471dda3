use reqwest::{Method, Url};

use crate::error::{Error, Result};

/// WebHDFS operation codes, sent as the `op` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListStatus,
    GetFileStatus,
    GetContentSummary,
    GetFileChecksum,
    GetHomeDirectory,
    Open,
    Mkdirs,
    Rename,
    Delete,
    SetPermission,
    SetOwner,
    SetReplication,
    SetTimes,
    Create,
    Append,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::ListStatus => "LISTSTATUS",
            Op::GetFileStatus => "GETFILESTATUS",
            Op::GetContentSummary => "GETCONTENTSUMMARY",
            Op::GetFileChecksum => "GETFILECHECKSUM",
            Op::GetHomeDirectory => "GETHOMEDIRECTORY",
            Op::Open => "OPEN",
            Op::Mkdirs => "MKDIRS",
            Op::Rename => "RENAME",
            Op::Delete => "DELETE",
            Op::SetPermission => "SETPERMISSION",
            Op::SetOwner => "SETOWNER",
            Op::SetReplication => "SETREPLICATION",
            Op::SetTimes => "SETTIMES",
            Op::Create => "CREATE",
            Op::Append => "APPEND",
        }
    }

    /// HTTP method the NameNode expects for this operation
    pub fn method(&self) -> Method {
        match self {
            Op::ListStatus
            | Op::GetFileStatus
            | Op::GetContentSummary
            | Op::GetFileChecksum
            | Op::GetHomeDirectory
            | Op::Open => Method::GET,
            Op::Mkdirs
            | Op::Rename
            | Op::SetPermission
            | Op::SetOwner
            | Op::SetReplication
            | Op::SetTimes
            | Op::Create => Method::PUT,
            Op::Append => Method::POST,
            Op::Delete => Method::DELETE,
        }
    }
}

/// Builds NameNode request targets: base URL + prefix + remote path + query
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    user: Option<String>,
}

impl UrlBuilder {
    pub fn new(base_url: &str, prefix: &str, user: Option<String>) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| Error::InvalidConfig {
            message: format!("invalid base url {base_url:?}: {e}"),
        })?;
        base.set_query(None);
        base.set_fragment(None);

        {
            let mut segments = base.path_segments_mut().map_err(|_| Error::InvalidConfig {
                message: format!("base url {base_url:?} cannot carry a path"),
            })?;
            segments
                .pop_if_empty()
                .extend(prefix.split('/').filter(|s| !s.is_empty()));
        }

        Ok(Self {
            base,
            user: user.filter(|u| !u.is_empty()),
        })
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Compose the URL for `op` on `path`
    ///
    /// Leading slashes are stripped from `path`; each segment is percent-encoded
    /// once. The query is `op`, then `user.name` when configured, then `params`
    /// in the order given.
    pub fn operation_url(&self, path: &str, op: Op, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base.clone();

        {
            let mut segments = url.path_segments_mut().map_err(|_| Error::InvalidConfig {
                message: format!("base url {} cannot carry a path", self.base),
            })?;
            let mut remote = path
                .trim_start_matches('/')
                .split('/')
                .filter(|s| !s.is_empty())
                .peekable();
            if remote.peek().is_none() {
                segments.push("");
            } else {
                segments.extend(remote);
            }
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op.as_str());
            if let Some(user) = &self.user {
                query.append_pair("user.name", user);
            }
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// Make a remote path absolute
pub(crate) fn absolute_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Join a remote directory and a child name with exactly one separator
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if name.is_empty() {
        return if dir.is_empty() { "/".to_string() } else { dir.to_string() };
    }
    format!("{dir}/{name}")
}

/// Last component of a remote path, ignoring trailing slashes
pub(crate) fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(user: Option<&str>) -> UrlBuilder {
        UrlBuilder::new("http://namenode:9870", "/webhdfs/v1/", user.map(String::from)).unwrap()
    }

    #[test]
    fn test_operation_url_with_user() {
        let url = builder(Some("alice"))
            .operation_url("/data/logs", Op::ListStatus, &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://namenode:9870/webhdfs/v1/data/logs?op=LISTSTATUS&user.name=alice"
        );
    }

    #[test]
    fn test_operation_url_without_user() {
        let url = builder(None)
            .operation_url("data", Op::GetFileStatus, &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://namenode:9870/webhdfs/v1/data?op=GETFILESTATUS"
        );
    }

    #[test]
    fn test_empty_path_targets_root() {
        let url = builder(None)
            .operation_url("", Op::GetHomeDirectory, &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://namenode:9870/webhdfs/v1/?op=GETHOMEDIRECTORY"
        );

        let url = builder(None).operation_url("/", Op::ListStatus, &[]).unwrap();
        assert_eq!(url.path(), "/webhdfs/v1/");
    }

    #[test]
    fn test_extra_params_keep_caller_order() {
        let url = builder(Some("bob"))
            .operation_url(
                "/tmp/a.txt",
                Op::Create,
                &[
                    ("overwrite", "true".to_string()),
                    ("permission", "644".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.query(),
            Some("op=CREATE&user.name=bob&overwrite=true&permission=644")
        );
    }

    #[test]
    fn test_path_segments_encoded_once() {
        let url = builder(None)
            .operation_url("/my dir/report 1.csv", Op::Open, &[])
            .unwrap();
        assert_eq!(url.path(), "/webhdfs/v1/my%20dir/report%201.csv");
    }

    #[test]
    fn test_custom_prefix_and_base_path() {
        let urls = UrlBuilder::new("https://gateway/hdfs/", "/webhdfs/v1", None).unwrap();
        let url = urls.operation_url("x", Op::GetFileStatus, &[]).unwrap();
        assert_eq!(url.path(), "/hdfs/webhdfs/v1/x");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            UrlBuilder::new("not a url", "/webhdfs/v1/", None),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            UrlBuilder::new("mailto:ops@example.com", "/webhdfs/v1/", None),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_op_methods() {
        assert_eq!(Op::Create.method(), Method::PUT);
        assert_eq!(Op::Append.method(), Method::POST);
        assert_eq!(Op::Delete.method(), Method::DELETE);
        assert_eq!(Op::Open.method(), Method::GET);
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(join_path("/user/alice/", "a.txt"), "/user/alice/a.txt");
        assert_eq!(join_path("/", "a.txt"), "/a.txt");
        assert_eq!(join_path("", "a.txt"), "/a.txt");
        assert_eq!(absolute_path("tmp/x"), "/tmp/x");
        assert_eq!(absolute_path("/tmp/x"), "/tmp/x");
        assert_eq!(file_name("/data/report.csv"), "report.csv");
        assert_eq!(file_name("/data/dir/"), "dir");
        assert_eq!(file_name("plain"), "plain");
    }
}
