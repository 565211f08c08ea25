//! Locale phrase catalogs for recommendations and probe labels.
//!
//! The catalogs are closed: every canonical finding code known to the scoring
//! engine has a phrase in every supported locale, which the tests verify
//! exhaustively.

use super::value_objects::{Locale, ProbeKind};

impl Locale {
    /// Human-readable label for a probe category
    pub fn probe_label(&self, kind: ProbeKind) -> &'static str {
        match self {
            Locale::Ru => match kind {
                ProbeKind::Ssl => "SSL/HTTPS анализ",
                ProbeKind::Ports => "Сканирование портов",
                ProbeKind::Headers => "HTTP заголовки",
                ProbeKind::Cms => "CMS и уязвимости",
                ProbeKind::Ddos => "DDoS защита",
            },
            Locale::Uz => match kind {
                ProbeKind::Ssl => "SSL/HTTPS tahlili",
                ProbeKind::Ports => "Portlarni skanerlash",
                ProbeKind::Headers => "HTTP sarlavhalar",
                ProbeKind::Cms => "CMS va zaifliklar",
                ProbeKind::Ddos => "DDoS himoyasi",
            },
            Locale::En => match kind {
                ProbeKind::Ssl => "SSL/HTTPS analysis",
                ProbeKind::Ports => "Port scan",
                ProbeKind::Headers => "HTTP security headers",
                ProbeKind::Cms => "CMS and vulnerabilities",
                ProbeKind::Ddos => "DDoS protection",
            },
        }
    }

    /// Generic recommendation for a probe that timed out or failed
    pub fn could_not_verify(&self, kind: ProbeKind) -> String {
        let label = self.probe_label(kind);
        match self {
            Locale::Ru => format!(
                "Не удалось проверить: {} — повторите сканирование позже",
                label
            ),
            Locale::Uz => format!(
                "Tekshirib bo'lmadi: {} — keyinroq qayta urinib ko'ring",
                label
            ),
            Locale::En => format!("Could not verify {}, retry the scan later", label),
        }
    }

    /// Canonical recommendation for a finding code, if the code is known
    pub fn recommendation(&self, code: &str) -> Option<&'static str> {
        match self {
            Locale::Ru => recommendation_ru(code),
            Locale::Uz => recommendation_uz(code),
            Locale::En => recommendation_en(code),
        }
    }

    /// Fallback shown when no specific recommendation applies
    pub fn default_recommendation(&self) -> &'static str {
        match self {
            Locale::Ru => "Обратитесь к специалисту по информационной безопасности",
            Locale::Uz => "Axborot xavfsizligi bo'yicha mutaxassisga murojaat qiling",
            Locale::En => "Consult an information security specialist",
        }
    }
}

fn recommendation_ru(code: &str) -> Option<&'static str> {
    Some(match code {
        "ssl_not_enabled" => "Установите SSL сертификат и включите HTTPS",
        "ssl_handshake_failed" => "Исправьте проблемы с SSL конфигурацией",
        "ssl_expired" => "Срочно продлите истекший SSL сертификат",
        "ssl_expiring_soon" => "Продлите SSL сертификат до истечения срока действия",
        "ssl_self_signed" => "Замените самоподписанный сертификат на выданный доверенным центром",
        "ftp_exposed" => "Замените FTP на SFTP или FTPS для безопасной передачи файлов",
        "telnet_exposed" => "Замените Telnet на SSH для безопасного удаленного доступа",
        "rdp_exposed" => "Ограничьте доступ к RDP через VPN",
        "database_exposed" => "Закройте прямой доступ к базе данных из интернета",
        "hsts_missing" => "Добавьте заголовок Strict-Transport-Security",
        "csp_missing" => "Настройте Content Security Policy",
        "x_frame_options_missing" => "Добавьте заголовок X-Frame-Options",
        "x_content_type_options_missing" => "Добавьте заголовок X-Content-Type-Options",
        "referrer_policy_missing" => "Добавьте заголовок Referrer-Policy",
        "server_header_disclosed" => {
            "Скройте информационные заголовки сервера (Server, X-Powered-By)"
        }
        "cms_version_disclosed" => "Скройте версию CMS и обновите её до последней версии",
        "cms_files_exposed" => "Ограничьте доступ к системным файлам CMS",
        "no_cdn" => "Настройте CDN (например, Cloudflare) для защиты от DDoS атак",
        "no_rate_limiting" => "Настройте ограничение скорости запросов (rate limiting)",
        "single_origin_ip" => "Настройте балансировку нагрузки между несколькими серверами",
        _ => return None,
    })
}

fn recommendation_uz(code: &str) -> Option<&'static str> {
    Some(match code {
        "ssl_not_enabled" => "SSL sertifikat o'rnating va HTTPS ni yoqing",
        "ssl_handshake_failed" => "SSL konfiguratsiyasidagi muammolarni bartaraf eting",
        "ssl_expired" => "Muddati o'tgan SSL sertifikatni zudlik bilan yangilang",
        "ssl_expiring_soon" => "SSL sertifikat muddati tugashidan oldin uni uzaytiring",
        "ssl_self_signed" => "O'zi imzolangan sertifikatni ishonchli markaz sertifikatiga almashtiring",
        "ftp_exposed" => "Xavfsiz fayl uzatish uchun FTP o'rniga SFTP yoki FTPS dan foydalaning",
        "telnet_exposed" => "Xavfsiz masofaviy kirish uchun Telnet o'rniga SSH dan foydalaning",
        "rdp_exposed" => "RDP ga kirishni VPN orqali cheklang",
        "database_exposed" => "Ma'lumotlar bazasiga internetdan to'g'ridan-to'g'ri kirishni yoping",
        "hsts_missing" => "Strict-Transport-Security sarlavhasini qo'shing",
        "csp_missing" => "Content Security Policy sozlang",
        "x_frame_options_missing" => "X-Frame-Options sarlavhasini qo'shing",
        "x_content_type_options_missing" => "X-Content-Type-Options sarlavhasini qo'shing",
        "referrer_policy_missing" => "Referrer-Policy sarlavhasini qo'shing",
        "server_header_disclosed" => {
            "Server haqida ma'lumot beruvchi sarlavhalarni yashiring (Server, X-Powered-By)"
        }
        "cms_version_disclosed" => "CMS versiyasini yashiring va uni oxirgi versiyaga yangilang",
        "cms_files_exposed" => "CMS tizim fayllariga kirishni cheklang",
        "no_cdn" => "DDoS hujumlardan himoya uchun CDN sozlang (masalan, Cloudflare)",
        "no_rate_limiting" => "So'rovlar tezligini cheklashni (rate limiting) sozlang",
        "single_origin_ip" => "Bir nechta serverlar o'rtasida yuk balansini sozlang",
        _ => return None,
    })
}

fn recommendation_en(code: &str) -> Option<&'static str> {
    Some(match code {
        "ssl_not_enabled" => "Install an SSL certificate and enable HTTPS",
        "ssl_handshake_failed" => "Fix the SSL configuration problems",
        "ssl_expired" => "Renew the expired SSL certificate immediately",
        "ssl_expiring_soon" => "Renew the SSL certificate before it expires",
        "ssl_self_signed" => "Replace the self-signed certificate with one from a trusted CA",
        "ftp_exposed" => "Replace FTP with SFTP or FTPS for secure file transfer",
        "telnet_exposed" => "Replace Telnet with SSH for secure remote access",
        "rdp_exposed" => "Restrict RDP access behind a VPN",
        "database_exposed" => "Close direct database access from the internet",
        "hsts_missing" => "Add the Strict-Transport-Security header",
        "csp_missing" => "Configure a Content Security Policy",
        "x_frame_options_missing" => "Add the X-Frame-Options header",
        "x_content_type_options_missing" => "Add the X-Content-Type-Options header",
        "referrer_policy_missing" => "Add the Referrer-Policy header",
        "server_header_disclosed" => "Hide server information headers (Server, X-Powered-By)",
        "cms_version_disclosed" => "Hide the CMS version and update it to the latest release",
        "cms_files_exposed" => "Restrict access to CMS system files",
        "no_cdn" => "Put a CDN (for example, Cloudflare) in front of the site for DDoS protection",
        "no_rate_limiting" => "Configure request rate limiting",
        "single_origin_ip" => "Balance traffic across multiple origin servers",
        _ => return None,
    })
}
