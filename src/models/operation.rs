/// 对外部服务发起的四种请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// 例题解析
    Analyze,
    /// 类题生成
    Generate,
    /// PDF 下载
    DownloadPdf,
    /// Word 下载
    DownloadWord,
}

impl Operation {
    /// 相对于 API 基础路径的端点
    pub fn endpoint(self) -> &'static str {
        match self {
            Operation::Analyze => "/analyze",
            Operation::Generate => "/generate",
            Operation::DownloadPdf => "/download/pdf",
            Operation::DownloadWord => "/download/word",
        }
    }

    /// HTTP 状态码非成功时的提示文字
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Analyze => "解析に失敗しました",
            Operation::Generate => "類題生成に失敗しました",
            Operation::DownloadPdf => "PDF生成に失敗しました",
            Operation::DownloadWord => "Word生成に失敗しました",
        }
    }

    /// 弹窗提示的前缀
    pub fn alert_prefix(self) -> &'static str {
        match self {
            Operation::Analyze => "解析中にエラーが発生しました",
            Operation::Generate => "類題生成中にエラーが発生しました",
            Operation::DownloadPdf => "PDF生成中にエラーが発生しました",
            Operation::DownloadWord => "Word生成中にエラーが発生しました",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Analyze => "analyze",
            Operation::Generate => "generate",
            Operation::DownloadPdf => "download-pdf",
            Operation::DownloadWord => "download-word",
        };
        write!(f, "{}", name)
    }
}
