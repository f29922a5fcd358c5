use std::{
    io::{self, Cursor, Read, Write},
    process::{Command, Stdio},
    thread::{self, ScopedJoinHandle},
};

use anyhow::{Context, Result, anyhow, bail};
use image::ImageFormat;
use tracing::{debug, warn};

use crate::{normalize::PixelArray, ocr::Recognizer, raw::RawOutput};

/// 调用外部程序进行文字识别
///
/// 图片以 PNG 格式写入标准输入, 程序需在标准输出中给出 JSON 格式的识别结果
#[derive(Debug, Clone)]
pub struct ExternalRecognizer {
    program: String,
    args: Vec<String>,
}

impl ExternalRecognizer {
    /// 创建外部识别器
    ///
    /// # 参数
    ///
    /// * `program` - 程序路径
    /// * `args` - 程序参数
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// 写入后关闭管道, 使对方读到 EOF
fn write_pipe(pipe: Option<impl Write>, data: &[u8]) -> io::Result<()> {
    if let Some(mut pipe) = pipe {
        pipe.write_all(data)?;
    }
    Ok(())
}

fn read_pipe(pipe: Option<impl Read>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn join_pipe(handle: ScopedJoinHandle<'_, io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("读取外部识别程序输出的线程异常退出"))?
        .context("读取外部识别程序输出失败")
}

impl Recognizer for ExternalRecognizer {
    fn recognize(&self, pixels: &PixelArray) -> Result<RawOutput> {
        let mut png = Vec::new();
        pixels
            .to_image()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context("编码 PNG 图片失败")?;

        debug!("调用外部识别程序: {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("启动外部识别程序 {} 失败", self.program))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // 输出在独立线程中读取, 程序先写输出再读输入时不会互相阻塞
        let (status, stdout, stderr) = thread::scope(|s| -> Result<_> {
            let stdout = s.spawn(move || read_pipe(stdout));
            let stderr = s.spawn(move || read_pipe(stderr));

            if let Err(e) = write_pipe(stdin, &png) {
                warn!("向外部识别程序写入图片失败, 终止程序: {}", e);
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow::Error::new(e).context("向外部识别程序写入图片失败"));
            }

            let status = child.wait().context("等待外部识别程序结束失败")?;
            Ok((status, join_pipe(stdout)?, join_pipe(stderr)?))
        })?;

        if !status.success() {
            bail!(
                "外部识别程序退出异常 ({}): {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            );
        }

        let value =
            serde_json::from_slice(&stdout).context("外部识别程序输出不是合法的 JSON")?;
        Ok(RawOutput::Json(value))
    }
}
