pub mod github;
pub mod wechat;

pub use github::GithubProvider;
pub use wechat::WechatProvider;
