//! 对 `ctb-berry::dataset` 的更一层封装. 提供项目文件与目录的定位.

use std::env;
use std::path::PathBuf;

/// 项目描述文件的默认文件名.
pub const PROJECT_FILE: &str = "project.json";

/// 获取项目描述文件路径.
///
/// 1. 若给出了 `arg`, 则返回之;
/// 2. 若环境变量 `$CTB_PROJECT` 非空, 则返回其值;
/// 3. 否则, 返回 `$HOME/dataset/ctb/project.json`. 无法确定主目录时返回 `None`.
pub fn project_file_from_arg_env_or_home(arg: Option<String>) -> Option<PathBuf> {
    if let Some(a) = arg.filter(|a| !a.is_empty()) {
        return Some(PathBuf::from(a));
    }
    match env::var("CTB_PROJECT") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => ctb_berry::dataset::home_project_dir_with([PROJECT_FILE]),
    }
}

#[cfg(test)]
mod tests {
    use super::project_file_from_arg_env_or_home;
    use std::path::Path;

    #[test]
    fn test_arg_first() {
        let p = project_file_from_arg_env_or_home(Some("/tmp/p.json".to_string())).unwrap();
        assert_eq!(p, Path::new("/tmp/p.json"));
    }
}
